//! Architectural constants: the RV32I major opcodes and the memory map.

// Major opcodes (bits 6..0).

/// Load instructions (LB, LH, LW, LBU, LHU).
pub const OPC_LOAD: u32 = 0b000_0011;

/// Memory ordering instructions (FENCE, FENCE.I).
pub const OPC_MISC_MEM: u32 = 0b000_1111;

/// Immediate arithmetic instructions (ADDI, ANDI, SLLI, ...).
pub const OPC_OPIMM: u32 = 0b001_0011;

/// Add Upper Immediate to PC (AUIPC).
pub const OPC_AUIPC: u32 = 0b001_0111;

/// Store instructions (SB, SH, SW).
pub const OPC_STORE: u32 = 0b010_0011;

/// Register-register arithmetic (ADD, SUB, SLL, ...).
pub const OPC_RTYPE: u32 = 0b011_0011;

/// Load Upper Immediate (LUI).
pub const OPC_LUI: u32 = 0b011_0111;

/// Conditional branches (BEQ, BNE, ...).
pub const OPC_BRANCH: u32 = 0b110_0011;

/// Jump and Link Register (JALR).
pub const OPC_JALR: u32 = 0b110_0111;

/// Jump and Link (JAL).
pub const OPC_JAL: u32 = 0b110_1111;

/// System instructions (ECALL, EBREAK).
pub const OPC_SYSTEM: u32 = 0b111_0011;

// Memory map. Every simulated address belongs to exactly one of the four
// segments below; anything else is a bus error.

/// First byte of the text segment; also the default entry point.
pub const TEXT_BEGIN: u32 = 0x0000_0000;

/// First byte of the static data segment (`.data`).
pub const STATIC_BEGIN: u32 = 0x1000_0000;

/// First byte of the heap; `sbrk` hands out addresses from here.
pub const HEAP_BEGIN: u32 = 0x1004_0000;

/// One past the last heap byte; the `sbrk` ceiling.
pub const HEAP_END: u32 = 0x1008_0000;

/// One past the highest stack byte.
pub const STACK_END: u32 = 0x8000_0000;

/// Bytes reserved for the stack, growing down from [`STACK_END`].
pub const STACK_SIZE: u32 = 0x0010_0000;

/// Initial value of `sp`.
pub const STACK_BEGIN: u32 = 0x7FFF_FFF0;

/// Initial value of `gp`, pointing into the static segment so that
/// gp-relative addressing reaches the first 4 KiB of `.data` both ways.
pub const GP_BEGIN: u32 = STATIC_BEGIN + 0x800;
