//! Links assembled units into one loadable image.
//!
//! Units keep their order: unit i's text starts at `TEXT_BEGIN` plus the text
//! bytes of units before it, its data likewise above `STATIC_BEGIN`. All
//! relocations are resolved here, against the unit's own symbols first and
//! the union of `.globl` symbols second.

use std::collections::HashMap;

use thiserror::Error;

use crate::kestrel::arch;
use crate::kestrel::asm::{Program, Reloc, RelocKind, Segment, SourceLine, Symbol};
use crate::kestrel::word;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("duplicate global symbol: {0}")]
    DuplicateGlobal(String),

    #[error("unresolved symbol: {0}")]
    Unresolved(String),

    #[error("relocation target for {label} out of range")]
    OffsetOutOfRange { label: String },

    #[error("data does not fit the static segment ({0} bytes)")]
    DataTooLarge(usize),
}

/// A fully linked program: every relocation patched, every symbol absolute.
pub struct LinkedProgram {
    pub text: Vec<u32>,
    pub data: Vec<u8>,
    /// Final addresses of all symbols, for the host's views.
    pub symbols: HashMap<String, u32>,
    /// Initial pc: `main` if defined, otherwise the first instruction.
    pub entry: u32,
    /// One entry per instruction in `text`.
    pub debug: Vec<SourceLine>,
}

pub fn link(programs: &[Program]) -> Result<LinkedProgram, LinkError> {
    // final base addresses, by appending
    let mut text_bases = Vec::with_capacity(programs.len());
    let mut data_bases = Vec::with_capacity(programs.len());
    let mut text_next = arch::TEXT_BEGIN;
    let mut data_next = arch::STATIC_BEGIN;
    for p in programs {
        text_bases.push(text_next);
        data_bases.push(data_next);
        text_next += (p.text.len() as u32) * 4;
        data_next += p.data.len() as u32;
    }
    let total_data = (data_next - arch::STATIC_BEGIN) as usize;
    if total_data > (arch::HEAP_BEGIN - arch::STATIC_BEGIN) as usize {
        return Err(LinkError::DataTooLarge(total_data));
    }

    let addr_of = |unit: usize, sym: &Symbol| match sym.segment {
        Segment::Text => text_bases[unit] + sym.offset,
        Segment::Data => data_bases[unit] + sym.offset,
    };

    // union of exported symbols
    let mut globals: HashMap<String, u32> = HashMap::new();
    for (i, p) in programs.iter().enumerate() {
        for (name, sym) in &p.symbols {
            if sym.global && globals.insert(name.clone(), addr_of(i, sym)).is_some() {
                return Err(LinkError::DuplicateGlobal(name.clone()));
            }
        }
    }

    let mut text: Vec<u32> = Vec::new();
    let mut data: Vec<u8> = Vec::new();
    let mut debug: Vec<SourceLine> = Vec::new();
    let mut symbols: HashMap<String, u32> = HashMap::new();

    for (i, p) in programs.iter().enumerate() {
        let unit_start = text.len();
        text.extend_from_slice(&p.text);
        data.extend_from_slice(&p.data);
        debug.extend(p.debug.iter().cloned());
        for (name, sym) in &p.symbols {
            symbols.insert(name.clone(), addr_of(i, sym));
        }

        for reloc in &p.relocs {
            let target = match p.symbols.get(&reloc.label) {
                Some(sym) => addr_of(i, sym),
                None => *globals
                    .get(&reloc.label)
                    .ok_or_else(|| LinkError::Unresolved(reloc.label.clone()))?,
            };
            let inst_addr = text_bases[i] + (reloc.index as u32) * 4;
            let slot = unit_start + reloc.index;
            text[slot] = patch(text[slot], reloc, target, inst_addr)?;
        }
    }

    let entry = globals
        .get("main")
        .copied()
        .or_else(|| {
            programs
                .iter()
                .enumerate()
                .find_map(|(i, p)| p.symbols.get("main").map(|s| addr_of(i, s)))
        })
        .unwrap_or(arch::TEXT_BEGIN);

    Ok(LinkedProgram {
        text,
        data,
        symbols,
        entry,
        debug,
    })
}

fn patch(w: u32, reloc: &Reloc, target: u32, inst_addr: u32) -> Result<u32, LinkError> {
    let out_of_range = || LinkError::OffsetOutOfRange {
        label: reloc.label.clone(),
    };
    Ok(match reloc.kind {
        RelocKind::Branch => {
            let off = target.wrapping_sub(inst_addr) as i32;
            if off % 2 != 0 || !(-4096..=4094).contains(&off) {
                return Err(out_of_range());
            }
            word::set_imm_b(w, off)
        }
        RelocKind::Jump => {
            let off = target.wrapping_sub(inst_addr) as i32;
            if off % 2 != 0 || !(-(1 << 20)..(1 << 20)).contains(&off) {
                return Err(out_of_range());
            }
            word::set_imm_j(w, off)
        }
        RelocKind::Hi20 => {
            // offset from the auipc itself; rounded so the signed low half
            // of the pair adds back to the exact target
            let off = target.wrapping_sub(inst_addr) as i32;
            let hi = ((off as i64 + 0x800) >> 12) as u32;
            word::set_imm_u(w, (hi << 12) as i32)
        }
        RelocKind::Lo12 => {
            // the paired auipc is the previous instruction
            let off = target.wrapping_sub(inst_addr.wrapping_sub(4)) as i32;
            let hi = (off as i64 + 0x800) >> 12;
            let lo = (off as i64 - (hi << 12)) as i32;
            word::set_imm_i(w, lo)
        }
    })
}
