//! # Instruction/Pseudo Table (C2)
//!
//! Static catalog of register names, pseudo-op operand shapes, and
//! instruction patterns. Everything here is data, not behavior — the fuzzy
//! classification that consults it lives in the statement builder (C3) and
//! encoder (C6).
//!
//! The eight `br*` mnemonics are listed as eight independent patterns, each
//! with its own fixed `nzp` bits, rather than parsed from a `br` prefix plus
//! a suffix at runtime — see the design notes this resolves.

pub mod levenshtein;

/// One slot in an instruction's 16-bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Fixed,
    Register,
    SignedImmediate,
    UnsignedImmediate,
    PcOffsetSigned,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    pub width: u32,
    pub fixed_value: u16,
}

impl Slot {
    pub const fn fixed(width: u32, value: u16) -> Self {
        Self { kind: SlotKind::Fixed, width, fixed_value: value }
    }
    pub const fn register() -> Self {
        Self { kind: SlotKind::Register, width: 3, fixed_value: 0 }
    }
    pub const fn signed(width: u32) -> Self {
        Self { kind: SlotKind::SignedImmediate, width, fixed_value: 0 }
    }
    pub const fn unsigned(width: u32) -> Self {
        Self { kind: SlotKind::UnsignedImmediate, width, fixed_value: 0 }
    }
    pub const fn pc_offset(width: u32) -> Self {
        Self { kind: SlotKind::PcOffsetSigned, width, fixed_value: 0 }
    }

    /// A single character summarizing this slot's *operand* shape, used by
    /// the encoder's candidate scoring (§4.6.1). FIXED slots don't consume
    /// an operand, so they have no character.
    pub fn operand_char(&self) -> Option<char> {
        match self.kind {
            SlotKind::Fixed => None,
            SlotKind::Register => Some('r'),
            SlotKind::SignedImmediate | SlotKind::UnsignedImmediate => Some('n'),
            SlotKind::PcOffsetSigned | SlotKind::Label => Some('s'),
        }
    }
}

/// One instruction pattern: a mnemonic plus an ordered slot list whose
/// widths sum to 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub mnemonic: &'static str,
    pub slots: &'static [Slot],
}

impl Pattern {
    /// The operand-shape string this pattern expects, e.g. `"rrr"` for
    /// register-form `add`, `"rrn"` for immediate-form.
    pub fn operand_shape(&self) -> String {
        self.slots.iter().filter_map(Slot::operand_char).collect()
    }

    pub fn operand_count(&self) -> usize {
        self.slots.iter().filter(|s| s.kind != SlotKind::Fixed).count()
    }
}

macro_rules! pat {
    ($mnemonic:expr, [$($slot:expr),* $(,)?]) => {
        Pattern { mnemonic: $mnemonic, slots: &[$($slot),*] }
    };
}

// Condition-code masks for the eight `br*` variants (n=4, z=2, p=1).
const NZP_N: u16 = 0b100;
const NZP_Z: u16 = 0b010;
const NZP_P: u16 = 0b001;
const NZP_NZ: u16 = 0b110;
const NZP_ZP: u16 = 0b011;
const NZP_NP: u16 = 0b101;
const NZP_NZP: u16 = 0b111;

pub static PATTERNS: &[Pattern] = &[
    // ADD
    pat!("add", [Slot::fixed(4, 0x1), Slot::register(), Slot::register(), Slot::fixed(3, 0x0), Slot::register()]),
    pat!("add", [Slot::fixed(4, 0x1), Slot::register(), Slot::register(), Slot::fixed(1, 0x1), Slot::signed(5)]),
    // AND
    pat!("and", [Slot::fixed(4, 0x5), Slot::register(), Slot::register(), Slot::fixed(3, 0x0), Slot::register()]),
    pat!("and", [Slot::fixed(4, 0x5), Slot::register(), Slot::register(), Slot::fixed(1, 0x1), Slot::signed(5)]),
    // NOT
    pat!("not", [Slot::fixed(4, 0x9), Slot::register(), Slot::register(), Slot::fixed(6, 0x3F)]),
    // BR family — eight distinct patterns, one per nzp combination.
    pat!("br", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_NZP), Slot::pc_offset(9)]),
    pat!("brn", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_N), Slot::pc_offset(9)]),
    pat!("brz", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_Z), Slot::pc_offset(9)]),
    pat!("brp", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_P), Slot::pc_offset(9)]),
    pat!("brnz", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_NZ), Slot::pc_offset(9)]),
    pat!("brzp", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_ZP), Slot::pc_offset(9)]),
    pat!("brnp", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_NP), Slot::pc_offset(9)]),
    pat!("brnzp", [Slot::fixed(4, 0x0), Slot::fixed(3, NZP_NZP), Slot::pc_offset(9)]),
    // Control transfer
    pat!("jmp", [Slot::fixed(4, 0xC), Slot::fixed(3, 0x0), Slot::register(), Slot::fixed(6, 0x0)]),
    pat!("ret", [Slot::fixed(4, 0xC), Slot::fixed(3, 0x0), Slot::fixed(3, 0x7), Slot::fixed(6, 0x0)]),
    pat!("jsr", [Slot::fixed(4, 0x4), Slot::fixed(1, 0x1), Slot::pc_offset(11)]),
    pat!("jsrr", [Slot::fixed(4, 0x4), Slot::fixed(1, 0x0), Slot::fixed(2, 0x0), Slot::register(), Slot::fixed(6, 0x0)]),
    // Memory access
    pat!("ld", [Slot::fixed(4, 0x2), Slot::register(), Slot::pc_offset(9)]),
    pat!("ldi", [Slot::fixed(4, 0xA), Slot::register(), Slot::pc_offset(9)]),
    pat!("ldr", [Slot::fixed(4, 0x6), Slot::register(), Slot::register(), Slot::signed(6)]),
    pat!("lea", [Slot::fixed(4, 0xE), Slot::register(), Slot::pc_offset(9)]),
    pat!("st", [Slot::fixed(4, 0x3), Slot::register(), Slot::pc_offset(9)]),
    pat!("sti", [Slot::fixed(4, 0xB), Slot::register(), Slot::pc_offset(9)]),
    pat!("str", [Slot::fixed(4, 0x7), Slot::register(), Slot::register(), Slot::signed(6)]),
    // System
    pat!("rti", [Slot::fixed(4, 0x8), Slot::fixed(12, 0x000)]),
    pat!("trap", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::unsigned(8)]),
    pat!("nop", [Slot::fixed(4, 0x0), Slot::fixed(3, 0x0), Slot::fixed(9, 0x000)]),
    // TRAP service pseudo-instructions (zero operands, fixed trap vector).
    pat!("getc", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x20)]),
    pat!("out", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x21)]),
    pat!("putc", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x21)]),
    pat!("puts", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x22)]),
    pat!("in", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x23)]),
    pat!("putsp", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x24)]),
    pat!("halt", [Slot::fixed(4, 0xF), Slot::fixed(4, 0x0), Slot::fixed(8, 0x25)]),
];

const REGISTERS: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

/// One of the five pseudo-ops' operand shapes (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoOperand {
    Numeric,
    NumericOrLabel,
    PositiveNumeric,
    StringLiteral,
    None,
}

pub struct PseudoPattern {
    pub name: &'static str,
    pub operand: PseudoOperand,
}

pub static PSEUDO_OPS: &[PseudoPattern] = &[
    PseudoPattern { name: ".orig", operand: PseudoOperand::Numeric },
    PseudoPattern { name: ".fill", operand: PseudoOperand::NumericOrLabel },
    PseudoPattern { name: ".blkw", operand: PseudoOperand::PositiveNumeric },
    PseudoPattern { name: ".stringz", operand: PseudoOperand::StringLiteral },
    PseudoPattern { name: ".end", operand: PseudoOperand::None },
];

/// True if `s` (case-insensitively) names one of the five pseudo-ops.
pub fn is_pseudo_name(s: &str) -> bool {
    pseudo_for(s).is_some()
}

pub fn pseudo_for(s: &str) -> Option<&'static PseudoPattern> {
    let lowered = s.to_ascii_lowercase();
    PSEUDO_OPS.iter().find(|p| p.name == lowered)
}

/// True if `s` (case-insensitively) names one of `r0`..`r7`.
pub fn is_register_name(s: &str) -> bool {
    register_index(s).is_some()
}

/// The 0-7 index of register name `s`, case-insensitive.
pub fn register_index(s: &str) -> Option<u16> {
    let lowered = s.to_ascii_lowercase();
    REGISTERS.iter().position(|r| *r == lowered).map(|i| i as u16)
}

/// The set of distinct mnemonics in the pattern table (each mnemonic
/// appears once here even if several patterns share it, like `add`).
fn mnemonics() -> impl Iterator<Item = &'static str> {
    let mut seen: Vec<&'static str> = Vec::new();
    PATTERNS.iter().filter_map(move |p| {
        if seen.contains(&p.mnemonic) {
            None
        } else {
            seen.push(p.mnemonic);
            Some(p.mnemonic)
        }
    })
}

/// Minimum Levenshtein distance from (case-folded) `s` to any mnemonic in
/// the pattern table.
pub fn nearest_instruction_distance(s: &str) -> usize {
    let lowered = s.to_ascii_lowercase();
    mnemonics()
        .map(|m| levenshtein::distance(&lowered, m))
        .min()
        .unwrap_or(usize::MAX)
}

/// All patterns sharing mnemonic `name` (case-insensitive); empty if `name`
/// isn't an instruction mnemonic at all.
pub fn patterns_for(name: &str) -> Vec<&'static Pattern> {
    let lowered = name.to_ascii_lowercase();
    PATTERNS.iter().filter(|p| p.mnemonic == lowered).collect()
}

/// All patterns whose mnemonic is within Levenshtein distance `max_distance`
/// of (case-folded) `name`, alongside that distance. Used by the encoder's
/// candidate selection (§4.6.1).
pub fn patterns_within(name: &str, max_distance: usize) -> Vec<(usize, &'static Pattern)> {
    let lowered = name.to_ascii_lowercase();
    let mut seen_distance: std::collections::HashMap<&'static str, usize> = std::collections::HashMap::new();
    for m in mnemonics() {
        seen_distance.insert(m, levenshtein::distance(&lowered, m));
    }
    PATTERNS
        .iter()
        .filter_map(|p| {
            let d = *seen_distance.get(p.mnemonic).unwrap();
            (d <= max_distance).then_some((d, p))
        })
        .collect()
}
