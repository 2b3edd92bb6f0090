use crate::kestrel::instruction::Instruction;
use crate::kestrel::word::{bits, funct3, imm_i, imm_u, rd, rs1};

pub(super) fn decode_opimm(w: u32) -> Result<Instruction, &'static str> {
    let rd = rd(w);
    let rs1 = rs1(w);
    let imm = imm_i(w);

    Ok(match funct3(w) {
        0x0 => Instruction::Addi { rd, rs1, imm },
        0x2 => Instruction::Slti { rd, rs1, imm },
        0x3 => Instruction::Sltiu { rd, rs1, imm },
        0x4 => Instruction::Xori { rd, rs1, imm },
        0x6 => Instruction::Ori { rd, rs1, imm },
        0x7 => Instruction::Andi { rd, rs1, imm },
        0x1 => {
            if bits(w, 31, 25) != 0 {
                return Err("invalid slli funct7");
            }
            let shamt = bits(w, 24, 20) as u8;
            Instruction::Slli { rd, rs1, shamt }
        }
        0x5 => {
            let shamt = bits(w, 24, 20) as u8;
            match bits(w, 31, 25) {
                0x00 => Instruction::Srli { rd, rs1, shamt },
                0x20 => Instruction::Srai { rd, rs1, shamt },
                _ => return Err("invalid shift funct7"),
            }
        }
        _ => return Err("invalid OP-IMM funct3"),
    })
}

pub(super) fn decode_loads(w: u32) -> Result<Instruction, &'static str> {
    let rd = rd(w);
    let rs1 = rs1(w);
    let imm = imm_i(w);

    Ok(match funct3(w) {
        0x0 => Instruction::Lb { rd, rs1, imm },
        0x1 => Instruction::Lh { rd, rs1, imm },
        0x2 => Instruction::Lw { rd, rs1, imm },
        0x4 => Instruction::Lbu { rd, rs1, imm },
        0x5 => Instruction::Lhu { rd, rs1, imm },
        _ => return Err("invalid load funct3"),
    })
}

pub(super) fn decode_jalr(w: u32) -> Result<Instruction, &'static str> {
    if funct3(w) != 0 {
        return Err("jalr with funct3 != 0");
    }
    Ok(Instruction::Jalr { rd: rd(w), rs1: rs1(w), imm: imm_i(w) })
}

pub(super) fn decode_lui(w: u32) -> Result<Instruction, &'static str> {
    Ok(Instruction::Lui { rd: rd(w), imm: imm_u(w) })
}

pub(super) fn decode_auipc(w: u32) -> Result<Instruction, &'static str> {
    Ok(Instruction::Auipc { rd: rd(w), imm: imm_u(w) })
}

pub(super) fn decode_misc_mem(w: u32) -> Result<Instruction, &'static str> {
    // fence's pred/succ bits do not matter to a single-hart interpreter
    match funct3(w) {
        0x0 => Ok(Instruction::Fence),
        0x1 => Ok(Instruction::FenceI),
        _ => Err("invalid misc-mem funct3"),
    }
}

pub(super) fn decode_system(w: u32) -> Result<Instruction, &'static str> {
    if funct3(w) != 0 || rd(w) != 0 || rs1(w) != 0 {
        return Err("invalid system instruction");
    }
    match bits(w, 31, 20) {
        0x000 => Ok(Instruction::Ecall),
        0x001 => Ok(Instruction::Ebreak),
        _ => Err("invalid system funct12"),
    }
}
