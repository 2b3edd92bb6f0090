use crate::kestrel::instruction::Instruction;
use crate::kestrel::word::{imm_j, rd};

pub(super) fn decode_jal(w: u32) -> Result<Instruction, &'static str> {
    Ok(Instruction::Jal { rd: rd(w), imm: imm_j(w) })
}
