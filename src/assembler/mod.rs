//! The Assembler module is in charge of taking a source file for one of the
//! supported instruction sets and producing the bytes it encodes to.
//!
//! It does this in strict order: a line lexer and parser produce statements,
//! the layout pass assigns addresses and binds labels, the encoding pass
//! writes bytes with placeholders for label operands, and the placeholders
//! are resolved once the whole file has been encoded.

pub mod ast;
pub mod encoder;
pub mod error;
pub mod isa;
pub mod layout;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod symbols;

use self::ast::Located;
use self::error::Result;
use self::isa::InstructionSet;
use self::layout::{statement_size, Layout};

/// Everything one assembly run produced.
pub struct Program {
    pub statements: Vec<Located>,
    pub layout: Layout,
    pub bytes: Vec<u8>,
}

impl Program {
    /// Address and final bytes of every statement, in source order.
    /// Bytes later overwritten through `ORG` show their final value.
    pub fn listing<'a>(&'a self, isa: &InstructionSet) -> Result<Vec<(usize, &'a Located, &'a [u8])>> {
        let mut out = Vec::with_capacity(self.statements.len());
        for (located, addr) in self.statements.iter().zip(self.layout.addresses.iter()) {
            let size = statement_size(&located.statement, isa)?;
            let start = (*addr).min(self.bytes.len());
            let end = (*addr + size).min(self.bytes.len());
            out.push((*addr, located, &self.bytes[start..end]));
        }
        Ok(out)
    }
}

/// Lays out only, for printing the symbol table without encoding anything.
pub fn layout_only(source: &str, isa: &InstructionSet) -> Result<Layout> {
    let statements = parser::Parser::new(lexer::tokenize(source)?, isa).run()?;
    layout::compute_layout(&statements, isa)
}

pub fn assemble(source: &str, isa: &InstructionSet) -> Result<Program> {
    info!("assembling for the {} instruction set ({} mnemonics)", isa.name, isa.len());

    let statements = parser::Parser::new(lexer::tokenize(source)?, isa).run()?;
    let layout = layout::compute_layout(&statements, isa)?;
    let stream = encoder::encode(&statements, isa)?;
    debug_assert_eq!(stream.cursor(), layout.end);

    let bytes = stream.resolve(&layout.symbols)?;
    info!("assembled {} byte(s)", bytes.len());

    Ok(Program { statements, layout, bytes })
}
