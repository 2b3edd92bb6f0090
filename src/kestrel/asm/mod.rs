//! Two-pass RV32I assembler.
//!
//! `assemble` never fails outright: every problem becomes an [`AsmError`]
//! with its source line, and assembly continues so all errors of a unit are
//! reported at once. The first pass expands pseudoinstructions, sizes the
//! segments and records label definitions; the second pass encodes, patching
//! local branch targets immediately and deferring everything whose final
//! address depends on link order to a relocation.

pub mod errors;
pub mod program;
mod pseudo;
mod utils;


pub use errors::AsmError;
pub use program::{Program, Reloc, RelocKind, Segment, SourceLine, Symbol};

use std::collections::HashMap;

use crate::kestrel::encoder::encode;
use crate::kestrel::instruction::Instruction;
use crate::kestrel::registers::parse_reg;
use utils::*;

enum Section {
    Text,
    Data,
}

struct Item {
    mnemonic: String,
    ops: Vec<String>,
    line: usize,
    src: String,
}

// nop; emitted in place of a statement that failed to encode so instruction
// indices and label offsets stay valid for later error reporting
const PLACEHOLDER: u32 = 0x0000_0013;

// ---------- API ----------
pub fn assemble(source: &str) -> (Program, Vec<AsmError>) {
    let mut errors: Vec<AsmError> = Vec::new();
    let mut symbols: HashMap<String, Symbol> = HashMap::new();
    let mut data: Vec<u8> = Vec::new();
    let mut items: Vec<Item> = Vec::new();
    let mut globals: Vec<(usize, String)> = Vec::new();
    let mut section = Section::Text;

    // 1st pass: expand pseudos, size statements, collect labels and data
    for (line_no, raw) in source.lines().enumerate() {
        let line = strip_comment(raw).trim().to_string();
        if line.is_empty() {
            continue;
        }

        let mut stmt = line.as_str();
        loop {
            let Some(idx) = stmt.find(':') else { break };
            let (head, tail) = stmt.split_at(idx);
            let name = head.trim();
            if !is_label_name(name) {
                break;
            }
            let sym = Symbol {
                segment: match section {
                    Section::Text => Segment::Text,
                    Section::Data => Segment::Data,
                },
                offset: match section {
                    Section::Text => (items.len() as u32) * 4,
                    Section::Data => data.len() as u32,
                },
                global: false,
            };
            if symbols.insert(name.to_string(), sym).is_some() {
                errors.push(AsmError {
                    line: line_no,
                    msg: format!("duplicate label: {name}"),
                });
            }
            stmt = tail[1..].trim_start();
        }
        if stmt.is_empty() {
            continue;
        }

        if stmt.starts_with('.') {
            let (dir, rest) = match stmt.split_once(char::is_whitespace) {
                Some((d, r)) => (d, r.trim()),
                None => (stmt, ""),
            };
            match dir {
                ".text" => section = Section::Text,
                ".data" => section = Section::Data,
                ".section" => match rest {
                    ".text" | "text" => section = Section::Text,
                    ".data" | "data" => section = Section::Data,
                    _ => errors.push(AsmError {
                        line: line_no,
                        msg: format!("unknown section: {rest}"),
                    }),
                },
                ".globl" | ".global" => {
                    let names = split_values(rest);
                    if names.is_empty() {
                        errors.push(AsmError {
                            line: line_no,
                            msg: format!("{dir}: expected a label"),
                        });
                    }
                    for name in names {
                        if is_label_name(&name) {
                            globals.push((line_no, name));
                        } else {
                            errors.push(AsmError {
                                line: line_no,
                                msg: format!("{dir}: invalid label: {name}"),
                            });
                        }
                    }
                }
                ".align" => match parse_imm(rest) {
                    Some(n) if (0..=16).contains(&n) => {
                        let boundary = 1usize << n;
                        match section {
                            Section::Text => {
                                while (items.len() * 4) % boundary != 0 {
                                    items.push(Item {
                                        mnemonic: "addi".into(),
                                        ops: vec!["x0".into(), "x0".into(), "0".into()],
                                        line: line_no,
                                        src: line.clone(),
                                    });
                                }
                            }
                            Section::Data => {
                                while data.len() % boundary != 0 {
                                    data.push(0);
                                }
                            }
                        }
                    }
                    _ => errors.push(AsmError {
                        line: line_no,
                        msg: format!(".align: invalid alignment: {rest}"),
                    }),
                },
                ".byte" | ".half" | ".word" | ".ascii" | ".asciiz" | ".string" | ".space" => {
                    if matches!(section, Section::Text) {
                        errors.push(AsmError {
                            line: line_no,
                            msg: format!("{dir} outside .data"),
                        });
                    } else if let Err(msg) = emit_data(dir, rest, &mut data) {
                        errors.push(AsmError { line: line_no, msg });
                    }
                }
                _ => errors.push(AsmError {
                    line: line_no,
                    msg: format!("unknown directive: {dir}"),
                }),
            }
            continue;
        }

        if matches!(section, Section::Data) {
            errors.push(AsmError {
                line: line_no,
                msg: "instruction outside .text".into(),
            });
            continue;
        }

        let (mnemonic, rest) = match stmt.split_once(char::is_whitespace) {
            Some((m, r)) => (m, r),
            None => (stmt, ""),
        };
        let ops = split_operands(rest);
        match pseudo::expand(mnemonic, &ops) {
            Some(Ok(stmts)) => {
                for (m, o) in stmts {
                    items.push(Item {
                        mnemonic: m.to_string(),
                        ops: o,
                        line: line_no,
                        src: line.clone(),
                    });
                }
            }
            Some(Err(msg)) => errors.push(AsmError {
                line: line_no,
                msg: format!("{mnemonic}: {msg}"),
            }),
            None => items.push(Item {
                mnemonic: mnemonic.to_string(),
                ops,
                line: line_no,
                src: line.clone(),
            }),
        }
    }

    // apply .globl markers now that every definition is known
    for (line_no, name) in globals {
        match symbols.get_mut(&name) {
            Some(sym) => sym.global = true,
            None => errors.push(AsmError {
                line: line_no,
                msg: format!(".globl of undefined label: {name}"),
            }),
        }
    }

    // 2nd pass: encode
    let mut text = Vec::with_capacity(items.len());
    let mut relocs = Vec::new();
    let mut debug = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let offset = (index as u32) * 4;
        match encode_item(&item.mnemonic, &item.ops, offset, &symbols) {
            Ok((inst, reloc)) => {
                if let Some((kind, label)) = reloc {
                    relocs.push(Reloc { index, kind, label });
                }
                text.push(encode(inst));
            }
            Err(msg) => {
                errors.push(AsmError { line: item.line, msg });
                text.push(PLACEHOLDER);
            }
        }
        debug.push(SourceLine {
            line: item.line,
            text: item.src.clone(),
        });
    }

    errors.sort_by_key(|e| e.line);
    (
        Program {
            text,
            data,
            symbols,
            relocs,
            debug,
        },
        errors,
    )
}

// ---------- Internals ----------

fn emit_data(dir: &str, rest: &str, data: &mut Vec<u8>) -> Result<(), String> {
    match dir {
        ".byte" | ".half" | ".word" => {
            let values = split_values(rest);
            if values.is_empty() {
                return Err(format!("{dir}: expected at least one value"));
            }
            for tok in values {
                let v = parse_imm64(&tok)
                    .ok_or_else(|| format!("invalid {dir} value: {tok}"))?;
                match dir {
                    ".byte" => {
                        if !(-128..=255).contains(&v) {
                            return Err(format!(".byte outside -128..255: {v}"));
                        }
                        data.push(v as u8);
                    }
                    ".half" => {
                        if !(-32768..=65535).contains(&v) {
                            return Err(format!(".half outside -32768..65535: {v}"));
                        }
                        data.extend_from_slice(&(v as u16).to_le_bytes());
                    }
                    _ => {
                        if !(i32::MIN as i64..=u32::MAX as i64).contains(&v) {
                            return Err(format!(".word outside 32-bit range: {v}"));
                        }
                        data.extend_from_slice(&(v as u32).to_le_bytes());
                    }
                }
            }
        }
        ".ascii" => {
            let s = parse_str_lit(rest)?;
            data.extend_from_slice(s.as_bytes());
        }
        ".asciiz" | ".string" => {
            let s = parse_str_lit(rest)?;
            data.extend_from_slice(s.as_bytes());
            data.push(0);
        }
        ".space" => {
            let n = parse_imm64(rest).ok_or_else(|| format!(".space: invalid size: {rest}"))?;
            if !(0..=(1 << 20)).contains(&n) {
                return Err(format!(".space: size out of range: {n}"));
            }
            data.extend(std::iter::repeat(0).take(n as usize));
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn encode_item(
    mnemonic: &str,
    ops: &[String],
    offset: u32,
    symbols: &HashMap<String, Symbol>,
) -> Result<(Instruction, Option<(RelocKind, String)>), String> {
    use Instruction::*;

    let get_reg = |t: &str| parse_reg(t).ok_or_else(|| format!("invalid register: {t}"));
    let get_imm = |t: &str| parse_imm(t).ok_or_else(|| format!("invalid immediate: {t}"));

    let inst = match mnemonic {
        // ---------- R-type ----------
        "add" | "sub" | "sll" | "slt" | "sltu" | "xor" | "srl" | "sra" | "or" | "and" => {
            if ops.len() != 3 {
                return Err("expected 'rd, rs1, rs2'".into());
            }
            let rd = get_reg(&ops[0])?;
            let rs1 = get_reg(&ops[1])?;
            let rs2 = get_reg(&ops[2])?;
            match mnemonic {
                "add" => Add { rd, rs1, rs2 },
                "sub" => Sub { rd, rs1, rs2 },
                "sll" => Sll { rd, rs1, rs2 },
                "slt" => Slt { rd, rs1, rs2 },
                "sltu" => Sltu { rd, rs1, rs2 },
                "xor" => Xor { rd, rs1, rs2 },
                "srl" => Srl { rd, rs1, rs2 },
                "sra" => Sra { rd, rs1, rs2 },
                "or" => Or { rd, rs1, rs2 },
                "and" => And { rd, rs1, rs2 },
                _ => unreachable!(),
            }
        }

        // ---------- I-type ----------
        "addi" => {
            if ops.len() != 3 {
                return Err("expected 'rd, rs1, imm'".into());
            }
            let rd = get_reg(&ops[0])?;
            let rs1 = get_reg(&ops[1])?;
            if let Some((kind, label)) = percent_ref(&ops[2]) {
                if kind != RelocKind::Lo12 {
                    return Err("%hi is only valid with auipc".into());
                }
                return Ok((Addi { rd, rs1, imm: 0 }, Some((RelocKind::Lo12, label))));
            }
            let imm = check_signed(get_imm(&ops[2])?, 12, mnemonic)?;
            Addi { rd, rs1, imm }
        }
        "slti" | "sltiu" | "xori" | "ori" | "andi" => {
            if ops.len() != 3 {
                return Err("expected 'rd, rs1, imm'".into());
            }
            let rd = get_reg(&ops[0])?;
            let rs1 = get_reg(&ops[1])?;
            let imm = check_signed(get_imm(&ops[2])?, 12, mnemonic)?;
            match mnemonic {
                "slti" => Slti { rd, rs1, imm },
                "sltiu" => Sltiu { rd, rs1, imm },
                "xori" => Xori { rd, rs1, imm },
                "ori" => Ori { rd, rs1, imm },
                "andi" => Andi { rd, rs1, imm },
                _ => unreachable!(),
            }
        }
        "slli" | "srli" | "srai" => {
            if ops.len() != 3 {
                return Err("expected 'rd, rs1, shamt'".into());
            }
            let rd = get_reg(&ops[0])?;
            let rs1 = get_reg(&ops[1])?;
            let shamt = parse_shamt(&ops[2])?;
            match mnemonic {
                "slli" => Slli { rd, rs1, shamt },
                "srli" => Srli { rd, rs1, shamt },
                "srai" => Srai { rd, rs1, shamt },
                _ => unreachable!(),
            }
        }

        // ---------- Loads (imm(rs1)) ----------
        "lb" | "lh" | "lw" | "lbu" | "lhu" => {
            let (rd, imm, rs1) = load_like(ops)?;
            let imm = check_signed(imm, 12, mnemonic)?;
            match mnemonic {
                "lb" => Lb { rd, rs1, imm },
                "lh" => Lh { rd, rs1, imm },
                "lw" => Lw { rd, rs1, imm },
                "lbu" => Lbu { rd, rs1, imm },
                "lhu" => Lhu { rd, rs1, imm },
                _ => unreachable!(),
            }
        }

        // ---------- Stores (rs2, imm(rs1)) ----------
        "sb" | "sh" | "sw" => {
            let (rs2, imm, rs1) = store_like(ops)?;
            let imm = check_signed(imm, 12, mnemonic)?;
            match mnemonic {
                "sb" => Sb { rs2, rs1, imm },
                "sh" => Sh { rs2, rs1, imm },
                "sw" => Sw { rs2, rs1, imm },
                _ => unreachable!(),
            }
        }

        // ---------- Branches (rs1, rs2, label/offset) ----------
        "beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" => {
            if ops.len() != 3 {
                return Err("expected 'rs1, rs2, label/offset'".into());
            }
            let rs1 = get_reg(&ops[0])?;
            let rs2 = get_reg(&ops[1])?;
            let imm = branch_imm(&ops[2], offset, symbols, 13, mnemonic)?;
            match mnemonic {
                "beq" => Beq { rs1, rs2, imm },
                "bne" => Bne { rs1, rs2, imm },
                "blt" => Blt { rs1, rs2, imm },
                "bge" => Bge { rs1, rs2, imm },
                "bltu" => Bltu { rs1, rs2, imm },
                "bgeu" => Bgeu { rs1, rs2, imm },
                _ => unreachable!(),
            }
        }

        // ---------- U-type ----------
        "lui" => {
            if ops.len() != 2 {
                return Err("expected 'rd, imm'".into());
            }
            let rd = get_reg(&ops[0])?;
            if percent_ref(&ops[1]).is_some() {
                return Err("%hi is only valid with auipc".into());
            }
            let v = check_imm20(get_imm(&ops[1])?, mnemonic)?;
            Lui { rd, imm: ((v as u32) << 12) as i32 }
        }
        "auipc" => {
            if ops.len() != 2 {
                return Err("expected 'rd, imm'".into());
            }
            let rd = get_reg(&ops[0])?;
            if let Some((kind, label)) = percent_ref(&ops[1]) {
                if kind != RelocKind::Hi20 {
                    return Err("%lo is only valid with addi/jalr".into());
                }
                return Ok((Auipc { rd, imm: 0 }, Some((RelocKind::Hi20, label))));
            }
            let v = check_imm20(get_imm(&ops[1])?, mnemonic)?;
            Auipc { rd, imm: ((v as u32) << 12) as i32 }
        }

        // ---------- Jumps ----------
        "jal" => {
            if ops.len() != 2 {
                return Err("expected 'rd, label/offset'".into());
            }
            let rd = get_reg(&ops[0])?;
            let tok = &ops[1];
            if let Some(v) = parse_imm(tok) {
                if v % 2 != 0 {
                    return Err(format!("jal: offset {v} must be even"));
                }
                Jal { rd, imm: check_signed(v, 21, mnemonic)? }
            } else if is_label_name(tok) {
                match symbols.get(tok.as_str()) {
                    Some(sym) => {
                        if sym.segment != Segment::Text {
                            return Err(format!("jal: jump target {tok} is not in .text"));
                        }
                        let imm =
                            check_signed(sym.offset as i32 - offset as i32, 21, mnemonic)?;
                        Jal { rd, imm }
                    }
                    // defined in another unit; the linker patches it
                    None => return Ok((Jal { rd, imm: 0 }, Some((RelocKind::Jump, tok.clone())))),
                }
            } else {
                return Err(format!("jal: invalid jump target: {tok}"));
            }
        }
        "jalr" => {
            if ops.len() != 3 {
                return Err("expected 'rd, rs1, imm'".into());
            }
            let rd = get_reg(&ops[0])?;
            let rs1 = get_reg(&ops[1])?;
            if let Some((kind, label)) = percent_ref(&ops[2]) {
                if kind != RelocKind::Lo12 {
                    return Err("%hi is only valid with auipc".into());
                }
                return Ok((Jalr { rd, rs1, imm: 0 }, Some((RelocKind::Lo12, label))));
            }
            let imm = check_signed(get_imm(&ops[2])?, 12, mnemonic)?;
            Jalr { rd, rs1, imm }
        }

        // ---------- System / memory ordering ----------
        "fence" | "fence.i" | "ecall" | "ebreak" => {
            if !ops.is_empty() {
                return Err(format!("{mnemonic} takes no operands"));
            }
            match mnemonic {
                "fence" => Fence,
                "fence.i" => FenceI,
                "ecall" => Ecall,
                _ => Ebreak,
            }
        }

        _ => return Err(format!("unknown mnemonic: {mnemonic}")),
    };
    Ok((inst, None))
}
