use crate::kestrel::instruction::Instruction;
use crate::kestrel::word::{funct3, imm_b, rs1, rs2};

pub(super) fn decode(w: u32) -> Result<Instruction, &'static str> {
    let rs1 = rs1(w);
    let rs2 = rs2(w);
    let imm = imm_b(w);

    Ok(match funct3(w) {
        0x0 => Instruction::Beq { rs1, rs2, imm },
        0x1 => Instruction::Bne { rs1, rs2, imm },
        0x4 => Instruction::Blt { rs1, rs2, imm },
        0x5 => Instruction::Bge { rs1, rs2, imm },
        0x6 => Instruction::Bltu { rs1, rs2, imm },
        0x7 => Instruction::Bgeu { rs1, rs2, imm },
        _ => return Err("invalid branch funct3"),
    })
}
