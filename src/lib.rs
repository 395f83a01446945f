// Module naming follows project convention (Mbox = mailbox protocol core)
#[allow(non_snake_case)]
pub mod Mbox {
    pub mod Buffer {
        pub mod Buffer;
        pub mod Buffer_impl;
        pub mod layout;
        pub use Buffer::LogBuffer; // re-export for stable path
    }
    pub mod Structs {
        pub mod Command_Structs;
        pub use Command_Structs::{CmdStatus, Command}; // re-export for stable path
    }
    pub mod builder;
    pub mod host;
    pub mod iop;
    pub use builder::MailboxBuilder;
    pub use host::Host;
    pub use iop::Iop;
}
#[allow(non_snake_case)]
pub mod Core {
    pub mod SharedMemory;
    pub use SharedMemory::{
        attach_shared_memory, create_shared_memory, HeapRegion, RawHandle, SharedMemoryBackend,
    };
    pub mod bus;
    pub mod delay;
    pub mod region;
    pub use region::MailboxRegion;
}
#[allow(non_snake_case)]
pub mod Dispatch;
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
pub mod ffi;
