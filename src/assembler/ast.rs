//! This AST describes a parsed source file for either instruction set.
//!
//! Comments are prefixed with semicolons (;) and are single-line only.
//! Statements are delimited by newlines. A label definition may share a
//! line with the statement it names.
//!
//! Supported directives:
//!
//! ```nasm
//! .BYTE 0x41, 66   ; raw bytes (alias DB), each 0-255
//! .STR "hello"     ; the characters between the quotes
//! DW 0x1234, end   ; 16-bit words, high byte first (alias .WORD)
//! ORG 0x0100       ; continue output at an absolute address
//! ```
//!
//! Example source file (packed ISA):
//!
//! ```nasm
//! start:  LDI Z, 3        ; Inputs may be in decimal,
//!         LDI A, 0x2A     ; hexadecimal,
//!         LDI B, 0b1010   ; binary,
//!         LDI C, 'x'      ; or a quoted character.
//! loop:   INP
//!         TEST
//!         JZ loop         ; Labels may be used before or after definition.
//!         JMP start
//! msg:    .STR "done"
//! ```

use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Register(u8),
    /// Range-checked only where it is used.
    Immediate(u32),
    Char(u8),
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Register(idx) => write!(f, "r{}", idx),
            Operand::Immediate(val) => write!(f, "0x{:X}", val),
            Operand::Char(c) => write!(f, "'{}'", *c as char),
            Operand::Label(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    Byte(Vec<Operand>),
    Str(String),
    Word(Vec<Operand>),
    Org(u16),
}

impl Directive {
    /// Number of bytes the directive places in the output.
    /// `ORG` moves the location counter instead and occupies nothing.
    pub fn size(&self) -> usize {
        match self {
            Directive::Byte(values) => values.len(),
            Directive::Str(text) => text.chars().count(),
            Directive::Word(values) => values.len() * 2,
            Directive::Org(_) => 0,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Directive::Byte(values) => write!(f, ".BYTE {}", join(values)),
            Directive::Str(text) => write!(f, ".STR \"{}\"", text),
            Directive::Word(values) => write!(f, "DW {}", join(values)),
            Directive::Org(addr) => write!(f, "ORG 0x{:04X}", addr),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    Label(String),
    Directive(Directive),
    Instruction { mnemonic: String, operands: Vec<Operand> },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Label(name) => write!(f, "{}:", name),
            Statement::Directive(dir) => write!(f, "{}", dir),
            Statement::Instruction { mnemonic, operands } if operands.is_empty() => {
                write!(f, "{}", mnemonic)
            }
            Statement::Instruction { mnemonic, operands } => {
                write!(f, "{} {}", mnemonic, join(operands))
            }
        }
    }
}

/// A statement and the (1-based) source line it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Located {
    pub line: usize,
    pub statement: Statement,
}

fn join(operands: &[Operand]) -> String {
    operands
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
