use std::collections::HashMap;

use super::program::{RelocKind, Segment, Symbol};

/// Cuts a `#` or `;` comment, ignoring comment characters inside string and
/// character literals.
pub(crate) fn strip_comment(line: &str) -> &str {
    let mut in_str = false;
    let mut in_char = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if in_str || in_char {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if in_str && c == '"' {
                in_str = false;
            } else if in_char && c == '\'' {
                in_char = false;
            }
        } else if c == '"' {
            in_str = true;
        } else if c == '\'' {
            in_char = true;
        } else if c == '#' || c == ';' {
            return &line[..i];
        }
    }
    line
}

pub(crate) fn split_operands(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(|t| t.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splits directive values on commas and whitespace alike, so both
/// `.byte 1, 2` and `.byte 1 2` work.
pub(crate) fn split_values(rest: &str) -> Vec<String> {
    rest.split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Parses an immediate in decimal, hex (`0x`), binary (`0b`) or
/// character-literal form, with an optional sign.
pub(crate) fn parse_imm64(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() >= 3 && s.starts_with('\'') && s.ends_with('\'') {
        let inner = &s[1..s.len() - 1];
        let c = match inner {
            "\\n" => '\n',
            "\\t" => '\t',
            "\\r" => '\r',
            "\\0" => '\0',
            "\\\\" => '\\',
            "\\'" => '\'',
            _ => {
                let mut it = inner.chars();
                let c = it.next()?;
                if it.next().is_some() {
                    return None;
                }
                c
            }
        };
        return Some(c as i64);
    }
    let (neg, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let val = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(if neg { -val } else { val })
}

/// 32-bit immediate; values in the unsigned range wrap to their
/// two's-complement reading (`0xFFFFFFFF` is -1).
pub(crate) fn parse_imm(s: &str) -> Option<i32> {
    let v = parse_imm64(s)?;
    if (i32::MIN as i64..=u32::MAX as i64).contains(&v) {
        Some(v as i32)
    } else {
        None
    }
}

pub(crate) fn check_signed(imm: i32, bits: u32, ctx: &str) -> Result<i32, String> {
    let max = (1i32 << (bits - 1)) - 1;
    let min = -(1i32 << (bits - 1));
    if imm < min || imm > max {
        Err(format!(
            "{ctx}: immediate {imm} out of {bits}-bit signed range ({min}..{max})"
        ))
    } else {
        Ok(imm)
    }
}

/// Range check for a `lui`/`auipc` operand: a 20-bit value, with negative
/// values accepted and reinterpreted as their low 20 bits.
pub(crate) fn check_imm20(imm: i32, ctx: &str) -> Result<i32, String> {
    if !(-0x8_0000..=0xF_FFFF).contains(&imm) {
        Err(format!("{ctx}: immediate {imm} out of 20-bit range"))
    } else {
        Ok(imm)
    }
}

// Parse shift amount (shamt) for SLLI, SRLI, SRAI
pub(crate) fn parse_shamt(s: &str) -> Result<u8, String> {
    let v = parse_imm(s).ok_or_else(|| format!("invalid shamt: {s}"))?;
    if (0..=31).contains(&v) {
        Ok(v as u8)
    } else {
        Err(format!("shamt out of range: {v}"))
    }
}

/// Recognizes a `%hi(label)` or `%lo(label)` operand.
pub(crate) fn percent_ref(op: &str) -> Option<(RelocKind, String)> {
    let (kind, rest) = if let Some(r) = op.strip_prefix("%hi(") {
        (RelocKind::Hi20, r)
    } else if let Some(r) = op.strip_prefix("%lo(") {
        (RelocKind::Lo12, r)
    } else {
        return None;
    };
    let label = rest.strip_suffix(')')?;
    if is_label_name(label) {
        Some((kind, label.to_string()))
    } else {
        None
    }
}

/// Resolves a branch target token (label or byte offset) against the local
/// symbol table. Branches reach only this unit's text, so the label must be
/// defined here.
pub(crate) fn branch_imm(
    tok: &str,
    offset: u32,
    symbols: &HashMap<String, Symbol>,
    bits: u32,
    ctx: &str,
) -> Result<i32, String> {
    let imm = if let Some(v) = parse_imm(tok) {
        v
    } else {
        let sym = symbols
            .get(tok)
            .ok_or_else(|| format!("{ctx}: undefined label: {tok}"))?;
        if sym.segment != Segment::Text {
            return Err(format!("{ctx}: branch target {tok} is not in .text"));
        }
        sym.offset as i32 - offset as i32
    };
    if imm % 2 != 0 {
        return Err(format!("{ctx}: offset {imm} must be even"));
    }
    check_signed(imm, bits, ctx)
}

/// Parses a string literal after `.ascii`-family directives, honoring the
/// `\n \t \r \0 \\ \"` escapes.
pub(crate) fn parse_str_lit(rest: &str) -> Result<String, String> {
    let rest = rest.trim();
    let mut it = rest.chars();
    if it.next() != Some('"') {
        return Err(format!("expected a quoted string, found: {rest}"));
    }
    let mut out = String::new();
    loop {
        match it.next() {
            None => return Err("unterminated string literal".into()),
            Some('"') => break,
            Some('\\') => match it.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(c) => return Err(format!("invalid escape: \\{c}")),
                None => return Err("unterminated string literal".into()),
            },
            Some(c) => out.push(c),
        }
    }
    let tail: String = it.collect();
    if !tail.trim().is_empty() {
        return Err(format!("unexpected tokens after string: {}", tail.trim()));
    }
    Ok(out)
}

// lw rd, imm(rs1)   |  sw rs2, imm(rs1)
pub(crate) fn parse_memop(op: &str) -> Result<(i32, u8), String> {
    let (imm_s, rest) = op
        .split_once('(')
        .ok_or_else(|| format!("invalid mem operand: {op}"))?;
    let rs1_s = rest.strip_suffix(')').ok_or("missing ')'")?;
    let imm = parse_imm(imm_s.trim()).ok_or_else(|| format!("invalid imm: {imm_s}"))?;
    let rs1 = crate::kestrel::registers::parse_reg(rs1_s.trim())
        .ok_or_else(|| format!("invalid rs1: {rs1_s}"))?;
    Ok((imm, rs1))
}

pub(crate) fn load_like(ops: &[String]) -> Result<(u8, i32, u8), String> {
    if ops.len() != 2 {
        return Err("load: expected 'rd, imm(rs1)'".into());
    }
    let rd = crate::kestrel::registers::parse_reg(&ops[0]).ok_or("invalid rd")?;
    let (imm, rs1) = parse_memop(&ops[1])?;
    Ok((rd, imm, rs1))
}

pub(crate) fn store_like(ops: &[String]) -> Result<(u8, i32, u8), String> {
    if ops.len() != 2 {
        return Err("store: expected 'rs2, imm(rs1)'".into());
    }
    let rs2 = crate::kestrel::registers::parse_reg(&ops[0]).ok_or("invalid rs2")?;
    let (imm, rs1) = parse_memop(&ops[1])?;
    Ok((rs2, imm, rs1))
}
