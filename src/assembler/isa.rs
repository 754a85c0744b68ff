//! Instruction set descriptors.
//!
//! An `InstructionSet` is a table of `EncodingRule`s plus the register names
//! and output header the target expects. Both supported targets are plain
//! instances of it, so the passes never special-case a particular ISA.
//!
//! Flat ISA (register-pair opcodes, every operand trails the opcode):
//!
//! ```nasm
//! TAS            ; 0x01, A -> S
//! LIA 0x20       ; 0x04 0x20
//! LDA buffer     ; 0x11 lo hi
//! JNZ loop       ; 0x96 lo hi
//! ```
//!
//! Packed ISA (destination register in the top 3 bits of the opcode):
//!
//! ```nasm
//! LDI Z, 3       ; 0xE0 0x03
//! INP            ; 0x1C 0x0E
//! JZ  0x0002     ; 0x16 0x00 0x02 (big-endian target)
//! LXI C, table   ; 0x5C 0x00 hi lo
//! ```

use std::collections::HashMap;
use std::fmt;

use super::error::{ErrorKind, Result};
use super::output::{HeaderMode, DEFAULT_MAGIC};

/// How a single operand slot of an instruction is encoded.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OperandMode {
    /// Register index folded into the top 3 bits of the first opcode byte.
    /// Optional in source; defaults to register 0.
    RegisterPacked,
    ImmediateByte,
    ImmediateWord,
    LabelOrImmediateByte,
    LabelOrImmediateWord,
}

impl OperandMode {
    /// Number of trailing bytes this operand occupies.
    pub fn width(&self) -> usize {
        use OperandMode::*;
        match self {
            RegisterPacked => 0,
            ImmediateByte | LabelOrImmediateByte => 1,
            ImmediateWord | LabelOrImmediateWord => 2,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Opcode {
    Base(u8),
    Prefixed { prefix: u8, sub_opcode: u8 },
}

/// Byte order of a rule's 16-bit operand.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endian {
    Little,
    Big,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EncodingRule {
    pub mnemonic: &'static str,
    pub opcode: Opcode,
    pub operands: &'static [OperandMode],
    pub endian: Endian,
}

impl EncodingRule {
    /// Encoded length in bytes. Depends only on the rule, never on the
    /// operands a statement actually supplies.
    pub fn size(&self) -> usize {
        let opcode = match self.opcode {
            Opcode::Base(_) => 1,
            Opcode::Prefixed { .. } => 2,
        };
        opcode + self.operands.iter().map(OperandMode::width).sum::<usize>()
    }

    pub fn packs_register(&self) -> bool {
        self.operands.contains(&OperandMode::RegisterPacked)
    }
}

impl fmt::Display for EncodingRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.opcode {
            Opcode::Base(op) => write!(f, "{} (0x{:02X})", self.mnemonic, op),
            Opcode::Prefixed { prefix, sub_opcode } => {
                write!(f, "{} (0x{:02X} 0x{:02X})", self.mnemonic, prefix, sub_opcode)
            }
        }
    }
}

/// Packs a register index into the top 3 bits of an opcode byte.
pub fn pack(opcode: u8, register: u8) -> u8 {
    (opcode & 0x1F) | (register << 5)
}

use OperandMode::*;

const NONE: &[OperandMode] = &[];
const BYTE: &[OperandMode] = &[LabelOrImmediateByte];
const WORD: &[OperandMode] = &[LabelOrImmediateWord];
const REG: &[OperandMode] = &[RegisterPacked];
const REG_BYTE: &[OperandMode] = &[RegisterPacked, LabelOrImmediateByte];
const REG_WORD: &[OperandMode] = &[RegisterPacked, LabelOrImmediateWord];

const fn flat(mnemonic: &'static str, opcode: u8, operands: &'static [OperandMode]) -> EncodingRule {
    EncodingRule { mnemonic, opcode: Opcode::Base(opcode), operands, endian: Endian::Little }
}

const fn base(mnemonic: &'static str, opcode: u8, operands: &'static [OperandMode]) -> EncodingRule {
    EncodingRule { mnemonic, opcode: Opcode::Base(opcode), operands, endian: Endian::Big }
}

const fn ext(mnemonic: &'static str, prefix: u8, sub_opcode: u8, operands: &'static [OperandMode]) -> EncodingRule {
    EncodingRule { mnemonic, opcode: Opcode::Prefixed { prefix, sub_opcode }, operands, endian: Endian::Big }
}

/// Every (operation, register) pair has its own opcode.
static FLAT_RULES: &[EncodingRule] = &[
    flat("TAA", 0x00, NONE), flat("TAS", 0x01, NONE), flat("TAH", 0x02, NONE), flat("TAL", 0x03, NONE),
    flat("TSA", 0x40, NONE), flat("TSS", 0x41, NONE), flat("TSH", 0x42, NONE), flat("TSL", 0x43, NONE),
    flat("THA", 0x80, NONE), flat("THS", 0x81, NONE), flat("THH", 0x82, NONE), flat("THL", 0x83, NONE),
    flat("TLA", 0xC0, NONE), flat("TLS", 0xC1, NONE), flat("TLH", 0xC2, NONE), flat("TLL", 0xC3, NONE),

    flat("LIA", 0x04, BYTE), flat("LIS", 0x05, BYTE), flat("LIL", 0x06, BYTE),
    flat("ADI", 0x07, BYTE), flat("SUI", 0x08, BYTE), flat("ANI", 0x09, BYTE),
    flat("ORI", 0x0A, BYTE), flat("XRI", 0x0B, BYTE),

    flat("ADD", 0x0C, WORD), flat("SUB", 0x0D, WORD), flat("AND", 0x0E, WORD),
    flat("ORA", 0x0F, WORD), flat("XRA", 0x10, WORD),
    flat("LDA", 0x11, WORD), flat("STA", 0x12, WORD),
    flat("LDH", 0x13, NONE), flat("STH", 0x14, NONE),

    flat("JMP", 0x15, WORD),
    // Conditional jumps share 0x16; the condition lives in the top two bits.
    flat("JZ", 0x16, WORD), flat("JC", 0x56, WORD), flat("JNZ", 0x96, WORD), flat("JNC", 0xD6, WORD),

    flat("INL", 0x17, NONE), flat("DEL", 0x18, NONE), flat("AHI", 0x19, NONE), flat("AHD", 0x1A, NONE),
    flat("NOP", 0x1B, NONE), flat("CLC", 0x1C, NONE), flat("SEC", 0x1D, NONE),
    flat("OUT", 0x1E, NONE), flat("IN", 0x1F, NONE),
    flat("PHA", 0x20, NONE), flat("PHH", 0x21, NONE), flat("PHL", 0x22, NONE),
    flat("PLA", 0x23, NONE), flat("PLH", 0x24, NONE), flat("PLL", 0x25, NONE),
    flat("HLT", 0x26, NONE),
];

static PACKED_RULES: &[EncodingRule] = &[
    base("LDI", 0x00, REG_BYTE),
    base("LDA", 0x01, REG), base("LDB", 0x02, REG), base("LDC", 0x03, REG), base("LDD", 0x04, REG),
    base("LDSPH", 0x05, REG), base("LDSPL", 0x06, REG),
    base("LDR", 0x07, REG_BYTE), base("STR", 0x08, REG_BYTE),
    base("ADD", 0x09, REG), base("SUB", 0x0A, REG), base("ADC", 0x0B, REG), base("SBB", 0x0C, REG),
    base("AND", 0x0D, REG), base("OR", 0x0E, REG), base("XOR", 0x0F, REG),
    base("ROL", 0x10, REG), base("ROR", 0x11, REG),
    base("LDR_C", 0x12, REG), base("STR_C", 0x13, REG),
    base("JMP", 0x14, WORD), base("JC", 0x15, WORD), base("JZ", 0x16, WORD),
    base("JNC", 0x17, WORD), base("JNZ", 0x18, WORD),
    base("PUSH", 0x19, REG), base("POP", 0x1A, REG),
    base("HLT", 0x1F, NONE),

    ext("LXI", 0x1C, 0x00, REG_WORD),
    ext("LXAB", 0x1C, 0x01, REG), ext("LXCD", 0x1C, 0x02, REG),
    ext("LXEF", 0x1C, 0x03, REG), ext("LXWZ", 0x1C, 0x04, REG),
    ext("SPCD", 0x1C, 0x05, REG), ext("SPAB", 0x1C, 0x06, REG),
    ext("SPEF", 0x1C, 0x07, REG), ext("SPWZ", 0x1C, 0x08, REG),
    ext("PCCD", 0x1C, 0x09, REG), ext("PCAB", 0x1C, 0x0A, REG),
    ext("PCEF", 0x1C, 0x0B, REG), ext("PCWZ", 0x1C, 0x0C, REG),
    ext("OUT", 0x1C, 0x0D, REG), ext("INP", 0x1C, 0x0E, REG),
    ext("GMASK", 0x1C, 0x0F, REG), ext("SMASK", 0x1C, 0x10, REG),
    ext("CALL", 0x1C, 0x11, REG), ext("IRET", 0x1C, 0x12, REG), ext("RET", 0x1C, 0x13, REG),

    ext("INC", 0x1D, 0x00, REG), ext("DEC", 0x1D, 0x01, REG), ext("TEST", 0x1D, 0x02, REG),
];

static PACKED_REGISTERS: &[&str] = &["A", "B", "C", "D", "E", "F", "W", "Z"];

pub struct InstructionSet {
    pub name: &'static str,
    pub header: HeaderMode,
    registers: &'static [&'static str],
    rules: HashMap<&'static str, EncodingRule>,
}

impl InstructionSet {
    /// Builds a descriptor from a rule table. A later rule with the same
    /// mnemonic replaces an earlier one.
    pub fn new(
        name: &'static str,
        registers: &'static [&'static str],
        table: &[EncodingRule],
        header: HeaderMode,
    ) -> Self {
        let rules = table.iter().map(|rule| (rule.mnemonic, *rule)).collect();
        InstructionSet { name, header, registers, rules }
    }

    pub fn flat() -> Self {
        InstructionSet::new("flat", &[], FLAT_RULES, HeaderMode::Raw)
    }

    pub fn packed() -> Self {
        InstructionSet::new("packed", PACKED_REGISTERS, PACKED_RULES, HeaderMode::Framed { magic: DEFAULT_MAGIC })
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "flat" => Some(InstructionSet::flat()),
            "packed" => Some(InstructionSet::packed()),
            _ => None,
        }
    }

    /// Finds the rule for a mnemonic, ignoring case.
    pub fn lookup(&self, mnemonic: &str) -> Result<&EncodingRule> {
        self.rules
            .get(mnemonic.to_ascii_uppercase().as_str())
            .ok_or_else(|| ErrorKind::UnknownMnemonic(mnemonic.to_string()).into())
    }

    /// Index of a register name, ignoring case.
    pub fn register(&self, name: &str) -> Option<u8> {
        self.registers
            .iter()
            .position(|reg| reg.eq_ignore_ascii_case(name))
            .map(|idx| idx as u8)
    }

    pub fn register_name(&self, idx: u8) -> Option<&'static str> {
        self.registers.get(idx as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
