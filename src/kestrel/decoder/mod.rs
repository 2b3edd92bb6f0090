mod btype;
mod itype;
mod jtype;
mod rtype;
mod stype;

use crate::kestrel::arch::*;
use crate::kestrel::instruction::Instruction;
use crate::kestrel::word;

/// Selects the unique instruction matching `word`, or a decode error when no
/// opcode/funct combination does.
pub fn decode(w: u32) -> Result<Instruction, &'static str> {
    match word::opcode(w) {
        OPC_RTYPE => rtype::decode(w),
        OPC_OPIMM => itype::decode_opimm(w),
        OPC_LOAD => itype::decode_loads(w),
        OPC_STORE => stype::decode(w),
        OPC_BRANCH => btype::decode(w),
        OPC_JAL => jtype::decode_jal(w),
        OPC_JALR => itype::decode_jalr(w),
        OPC_LUI => itype::decode_lui(w),
        OPC_AUIPC => itype::decode_auipc(w),
        OPC_MISC_MEM => itype::decode_misc_mem(w),
        OPC_SYSTEM => itype::decode_system(w),
        _ => Err("unknown opcode"),
    }
}

/// Renders `w` in the same syntax the assembler accepts, so a disassembled
/// word can be fed straight back in. Undecodable words become a `.word`
/// directive comment.
pub fn disasm(w: u32) -> String {
    use Instruction::*;
    let inst = match decode(w) {
        Ok(i) => i,
        Err(e) => return format!(".word 0x{w:08x} # {e}"),
    };
    match inst {
        Add { rd, rs1, rs2 }
        | Sub { rd, rs1, rs2 }
        | Sll { rd, rs1, rs2 }
        | Slt { rd, rs1, rs2 }
        | Sltu { rd, rs1, rs2 }
        | Xor { rd, rs1, rs2 }
        | Srl { rd, rs1, rs2 }
        | Sra { rd, rs1, rs2 }
        | Or { rd, rs1, rs2 }
        | And { rd, rs1, rs2 } => {
            format!("{} x{rd}, x{rs1}, x{rs2}", inst.mnemonic())
        }
        Addi { rd, rs1, imm }
        | Slti { rd, rs1, imm }
        | Sltiu { rd, rs1, imm }
        | Xori { rd, rs1, imm }
        | Ori { rd, rs1, imm }
        | Andi { rd, rs1, imm }
        | Jalr { rd, rs1, imm } => {
            format!("{} x{rd}, x{rs1}, {imm}", inst.mnemonic())
        }
        Slli { rd, rs1, shamt } | Srli { rd, rs1, shamt } | Srai { rd, rs1, shamt } => {
            format!("{} x{rd}, x{rs1}, {shamt}", inst.mnemonic())
        }
        Lb { rd, rs1, imm }
        | Lh { rd, rs1, imm }
        | Lw { rd, rs1, imm }
        | Lbu { rd, rs1, imm }
        | Lhu { rd, rs1, imm } => {
            format!("{} x{rd}, {imm}(x{rs1})", inst.mnemonic())
        }
        Sb { rs2, rs1, imm } | Sh { rs2, rs1, imm } | Sw { rs2, rs1, imm } => {
            format!("{} x{rs2}, {imm}(x{rs1})", inst.mnemonic())
        }
        Beq { rs1, rs2, imm }
        | Bne { rs1, rs2, imm }
        | Blt { rs1, rs2, imm }
        | Bge { rs1, rs2, imm }
        | Bltu { rs1, rs2, imm }
        | Bgeu { rs1, rs2, imm } => {
            format!("{} x{rs1}, x{rs2}, {imm}", inst.mnemonic())
        }
        Lui { rd, imm } | Auipc { rd, imm } => {
            format!("{} x{rd}, 0x{:x}", inst.mnemonic(), (imm as u32) >> 12)
        }
        Jal { rd, imm } => format!("jal x{rd}, {imm}"),
        Fence | FenceI | Ecall | Ebreak => inst.mnemonic().to_string(),
    }
}
