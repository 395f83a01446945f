use std::time::Duration;

/// Monotonic delay primitive.
///
/// Used both for protocol pacing (between mailbox polls in logging mode)
/// and by handlers for hardware timing compliance (sensor settle times).
pub trait DelaySource {
    fn delay_us(&mut self, us: u32);

    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// Wall-clock delays via `thread::sleep`.
#[derive(Debug, Default)]
pub struct SleepDelay;

impl DelaySource for SleepDelay {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Virtual-time delays for tests: no sleeping, just an elapsed counter.
#[derive(Debug, Default)]
pub struct ManualDelay {
    pub elapsed_us: u64,
}

impl DelaySource for ManualDelay {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
