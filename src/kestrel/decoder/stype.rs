use crate::kestrel::instruction::Instruction;
use crate::kestrel::word::{funct3, imm_s, rs1, rs2};

pub(super) fn decode(w: u32) -> Result<Instruction, &'static str> {
    let rs1 = rs1(w);
    let rs2 = rs2(w);
    let imm = imm_s(w);

    Ok(match funct3(w) {
        0x0 => Instruction::Sb { rs2, rs1, imm },
        0x1 => Instruction::Sh { rs2, rs1, imm },
        0x2 => Instruction::Sw { rs2, rs1, imm },
        _ => return Err("invalid store funct3"),
    })
}
