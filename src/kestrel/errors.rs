use thiserror::Error;

/// Bus and memory access errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemError {
    #[error("address 0x{0:08x} is outside every segment")]
    OutOfSegment(u32),

    #[error("unaligned {width}-byte access at 0x{addr:08x}")]
    Unaligned { addr: u32, width: u32 },
}

/// Runtime errors raised by a simulator step. The faulting instruction's pc
/// is left unchanged so the host can point at it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("fetch outside the text segment at pc 0x{0:08x}")]
    Fetch(u32),

    #[error("cannot decode word 0x{word:08x}: {what}")]
    Decode { word: u32, what: &'static str },

    #[error(transparent)]
    Mem(#[from] MemError),

    #[error("unknown environment call {0}")]
    UnknownSyscall(u32),

    #[error("sbrk of {0} bytes would leave the heap segment")]
    HeapOverflow(i32),
}
