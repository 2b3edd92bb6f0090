//! Pseudoinstruction expansion.
//!
//! A pure rewrite over token lists, run before any encoding: each pseudo
//! becomes one or more real statements, so the encoder only ever sees base
//! instructions. `%hi(label)`/`%lo(label)` operand markers produced here turn
//! into relocation requests at encoding time.

use super::utils::{is_label_name, parse_imm};

/// A rewritten statement: real mnemonic plus operand tokens.
pub(crate) type Stmt = (&'static str, Vec<String>);

fn one(m: &'static str, ops: Vec<String>) -> Result<Vec<Stmt>, String> {
    Ok(vec![(m, ops)])
}

fn arity(ops: &[String], n: usize, shape: &str) -> Result<(), String> {
    if ops.len() != n {
        Err(format!("expected '{shape}'"))
    } else {
        Ok(())
    }
}

/// Expands `mnemonic ops` if it is a pseudoinstruction. `None` means the
/// statement is a base instruction and passes through untouched.
pub(crate) fn expand(mnemonic: &str, ops: &[String]) -> Option<Result<Vec<Stmt>, String>> {
    let s = |t: &str| t.to_string();
    Some(match mnemonic {
        "nop" => {
            if !ops.is_empty() {
                return Some(Err("takes no operands".into()));
            }
            one("addi", vec![s("x0"), s("x0"), s("0")])
        }
        "mv" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("addi", vec![ops[0].clone(), ops[1].clone(), s("0")])),
        "li" => arity(ops, 2, "rd, imm").and_then(|_| {
            let imm = parse_imm(&ops[1])
                .ok_or_else(|| format!("invalid immediate: {}", ops[1]))?;
            if (-2048..=2047).contains(&imm) {
                one("addi", vec![ops[0].clone(), s("x0"), imm.to_string()])
            } else {
                // round the upper part so the signed low half adds back
                let v = imm as i64;
                let hi = ((v + 0x800) >> 12) as i32;
                let lo = (v - ((hi as i64) << 12)) as i32;
                Ok(vec![
                    ("lui", vec![ops[0].clone(), hi.to_string()]),
                    ("addi", vec![ops[0].clone(), ops[0].clone(), lo.to_string()]),
                ])
            }
        }),
        "la" => arity(ops, 2, "rd, label").and_then(|_| {
            if !is_label_name(&ops[1]) {
                return Err(format!("invalid label: {}", ops[1]));
            }
            Ok(vec![
                ("auipc", vec![ops[0].clone(), format!("%hi({})", ops[1])]),
                (
                    "addi",
                    vec![ops[0].clone(), ops[0].clone(), format!("%lo({})", ops[1])],
                ),
            ])
        }),
        "call" => arity(ops, 1, "label").and_then(|_| {
            if !is_label_name(&ops[0]) {
                return Err(format!("invalid label: {}", ops[0]));
            }
            Ok(vec![
                ("auipc", vec![s("x1"), format!("%hi({})", ops[0])]),
                ("jalr", vec![s("x1"), s("x1"), format!("%lo({})", ops[0])]),
            ])
        }),
        "j" => arity(ops, 1, "label/offset")
            .and_then(|_| one("jal", vec![s("x0"), ops[0].clone()])),
        "jal" if ops.len() == 1 => one("jal", vec![s("x1"), ops[0].clone()]),
        "jr" => arity(ops, 1, "rs")
            .and_then(|_| one("jalr", vec![s("x0"), ops[0].clone(), s("0")])),
        "jalr" if ops.len() == 1 => one("jalr", vec![s("x1"), ops[0].clone(), s("0")]),
        "ret" => {
            if !ops.is_empty() {
                return Some(Err("takes no operands".into()));
            }
            one("jalr", vec![s("x0"), s("x1"), s("0")])
        }

        "not" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("xori", vec![ops[0].clone(), ops[1].clone(), s("-1")])),
        "neg" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("sub", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "seqz" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("sltiu", vec![ops[0].clone(), ops[1].clone(), s("1")])),
        "snez" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("sltu", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "sltz" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("slt", vec![ops[0].clone(), ops[1].clone(), s("x0")])),
        "sgtz" => arity(ops, 2, "rd, rs")
            .and_then(|_| one("slt", vec![ops[0].clone(), s("x0"), ops[1].clone()])),

        "beqz" => arity(ops, 2, "rs, label")
            .and_then(|_| one("beq", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "bnez" => arity(ops, 2, "rs, label")
            .and_then(|_| one("bne", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "blez" => arity(ops, 2, "rs, label")
            .and_then(|_| one("bge", vec![s("x0"), ops[0].clone(), ops[1].clone()])),
        "bgez" => arity(ops, 2, "rs, label")
            .and_then(|_| one("bge", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "bltz" => arity(ops, 2, "rs, label")
            .and_then(|_| one("blt", vec![ops[0].clone(), s("x0"), ops[1].clone()])),
        "bgtz" => arity(ops, 2, "rs, label")
            .and_then(|_| one("blt", vec![s("x0"), ops[0].clone(), ops[1].clone()])),

        // reversed-operand branches
        "ble" => arity(ops, 3, "rs1, rs2, label")
            .and_then(|_| one("bge", vec![ops[1].clone(), ops[0].clone(), ops[2].clone()])),
        "bgt" => arity(ops, 3, "rs1, rs2, label")
            .and_then(|_| one("blt", vec![ops[1].clone(), ops[0].clone(), ops[2].clone()])),
        "bleu" => arity(ops, 3, "rs1, rs2, label")
            .and_then(|_| one("bgeu", vec![ops[1].clone(), ops[0].clone(), ops[2].clone()])),
        "bgtu" => arity(ops, 3, "rs1, rs2, label")
            .and_then(|_| one("bltu", vec![ops[1].clone(), ops[0].clone(), ops[2].clone()])),

        "sgt" => arity(ops, 3, "rd, rs1, rs2")
            .and_then(|_| one("slt", vec![ops[0].clone(), ops[2].clone(), ops[1].clone()])),
        "sge" => arity(ops, 3, "rd, rs1, rs2").and_then(|_| {
            Ok(vec![
                ("slt", vec![ops[0].clone(), ops[1].clone(), ops[2].clone()]),
                ("xori", vec![ops[0].clone(), ops[0].clone(), s("1")]),
            ])
        }),

        _ => return None,
    })
}
