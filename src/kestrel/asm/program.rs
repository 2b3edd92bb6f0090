use std::collections::HashMap;

/// Which segment a symbol's offset is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Text,
    Data,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub segment: Segment,
    pub offset: u32,
    pub global: bool,
}

/// How the linker patches a relocated instruction once the target address is
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocKind {
    /// B-format pc-relative offset.
    Branch,
    /// J-format pc-relative offset.
    Jump,
    /// Upper 20 bits of an `auipc`-pair address, rounded so the paired low
    /// half can be added with sign.
    Hi20,
    /// Low 12 bits of an `auipc`-pair address; the `auipc` is the previous
    /// instruction.
    Lo12,
}

#[derive(Debug, Clone)]
pub struct Reloc {
    /// Index of the instruction to patch, within this unit's text.
    pub index: usize,
    pub kind: RelocKind,
    pub label: String,
}

/// Debug map entry: the source line an instruction came from.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub line: usize,
    pub text: String,
}

/// One assembled translation unit, immutable once returned.
#[derive(Debug, Default, Clone)]
pub struct Program {
    /// Encoded instructions in segment order.
    pub text: Vec<u32>,
    /// Raw `.data` bytes, little-endian where multi-byte.
    pub data: Vec<u8>,
    /// Labels defined in this unit, offsets relative to their segment.
    pub symbols: HashMap<String, Symbol>,
    /// Patches the linker must apply once addresses are final.
    pub relocs: Vec<Reloc>,
    /// One entry per instruction in `text`.
    pub debug: Vec<SourceLine>,
}
