use std::io;

/// Generic bus-transaction capability supplied by I2C/SPI drivers.
///
/// Device handlers invoke this opaquely; the dispatch core does not know or
/// care which bus a handler uses. Register maps and transaction encodings
/// are the peripheral's business.
pub trait BusTransport {
    /// Read `buf.len()` bytes from register `reg` of device `addr`.
    fn read(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> io::Result<()>;

    /// Write `buf` to register `reg` of device `addr`.
    fn write(&mut self, addr: u8, reg: u8, buf: &[u8]) -> io::Result<()>;
}
