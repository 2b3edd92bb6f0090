use crate::kestrel::instruction::Instruction;
use crate::kestrel::word::{funct3, funct7, rd, rs1, rs2};

pub(super) fn decode(w: u32) -> Result<Instruction, &'static str> {
    let rd = rd(w);
    let rs1 = rs1(w);
    let rs2 = rs2(w);

    Ok(match (funct7(w), funct3(w)) {
        (0x00, 0x0) => Instruction::Add { rd, rs1, rs2 },
        (0x20, 0x0) => Instruction::Sub { rd, rs1, rs2 },
        (0x00, 0x1) => Instruction::Sll { rd, rs1, rs2 },
        (0x00, 0x2) => Instruction::Slt { rd, rs1, rs2 },
        (0x00, 0x3) => Instruction::Sltu { rd, rs1, rs2 },
        (0x00, 0x4) => Instruction::Xor { rd, rs1, rs2 },
        (0x00, 0x5) => Instruction::Srl { rd, rs1, rs2 },
        (0x20, 0x5) => Instruction::Sra { rd, rs1, rs2 },
        (0x00, 0x6) => Instruction::Or { rd, rs1, rs2 },
        (0x00, 0x7) => Instruction::And { rd, rs1, rs2 },
        _ => return Err("invalid R-type funct"),
    })
}
