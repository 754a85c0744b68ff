//! Pass 1: assigns every statement an address and records label addresses.
//! No bytes are produced, and labels are never looked up, so a label may be
//! used before the line that defines it.
use std::convert::TryFrom;

use super::ast::{Directive, Located, Statement};
use super::error::{AsmError, ErrorKind, Result};
use super::isa::InstructionSet;
use super::symbols::SymbolTable;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Layout {
    pub symbols: SymbolTable,
    /// Start address of each statement, index for index.
    pub addresses: Vec<usize>,
    /// Location counter after the last statement.
    pub end: usize,
}

/// Bytes a statement occupies. Labels and `ORG` occupy none; an instruction
/// occupies its rule's size whatever operands it was given.
pub fn statement_size(statement: &Statement, isa: &InstructionSet) -> Result<usize> {
    match statement {
        Statement::Label(_) => Ok(0),
        Statement::Directive(dir) => Ok(dir.size()),
        Statement::Instruction { mnemonic, .. } => Ok(isa.lookup(mnemonic)?.size()),
    }
}

pub fn compute_layout(statements: &[Located], isa: &InstructionSet) -> Result<Layout> {
    let mut symbols = SymbolTable::new();
    let mut addresses = Vec::with_capacity(statements.len());
    let mut pc: usize = 0;

    for located in statements {
        addresses.push(pc);
        match &located.statement {
            Statement::Label(name) => {
                let addr = u16::try_from(pc).map_err(|_| {
                    AsmError::from(ErrorKind::OperandRange { value: pc as u32, max: 0xFFFF }).at(located.line)
                })?;
                match symbols.define(name, addr) {
                    Some(prev) => debug!("label `{}` redefined: 0x{:04X} -> 0x{:04X}", name, prev, addr),
                    None => debug!("label `{}` = 0x{:04X}", name, addr),
                }
            }
            Statement::Directive(Directive::Org(addr)) => {
                debug!("ORG 0x{:04X} on line {}", addr, located.line);
                pc = *addr as usize;
            }
            statement => {
                pc += statement_size(statement, isa).map_err(|e| e.at(located.line))?;
            }
        }
    }

    info!("layout: {} statement(s), {} label(s), end 0x{:04X}", statements.len(), symbols.len(), pc);
    Ok(Layout { symbols, addresses, end: pc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::lexer::tokenize;
    use super::super::parser::Parser;

    fn layout(src: &str, isa: &InstructionSet) -> Result<Layout> {
        let statements = Parser::new(tokenize(src)?, isa).run()?;
        compute_layout(&statements, isa)
    }

    #[test]
    fn test_flat_sizes() {
        let isa = InstructionSet::flat();
        let out = layout(
            "
            start: TAS          ; 1
                   LIA 5        ; 2
                   STA 0x1234   ; 3
            data:  .BYTE 1, 2   ; 2
            msg:   .STR \"hey\" ; 3
            end:
            ",
            &isa,
        )
        .unwrap();
        assert_eq!(out.symbols.get("start"), Some(0));
        assert_eq!(out.symbols.get("data"), Some(6));
        assert_eq!(out.symbols.get("msg"), Some(8));
        assert_eq!(out.symbols.get("end"), Some(11));
        assert_eq!(out.end, 11);
    }

    #[test]
    fn test_packed_sizes() {
        let isa = InstructionSet::packed();
        let out = layout(
            "
            LDI Z, 3     ; 2
            CALL         ; 2
            LXI C, 0x10  ; 4
            JMP done     ; 3
            DW 1, 2      ; 4
            done: HLT    ; 1
            ",
            &isa,
        )
        .unwrap();
        assert_eq!(out.symbols.get("done"), Some(15));
        assert_eq!(out.end, 16);
    }

    #[test]
    fn test_size_ignores_operand_kind() {
        // A label, a number and a missing operand all reserve the same room.
        let isa = InstructionSet::flat();
        assert_eq!(layout("JMP target", &isa).unwrap().end, 3);
        assert_eq!(layout("JMP 0x1234", &isa).unwrap().end, 3);
        assert_eq!(layout("JMP", &isa).unwrap().end, 3);
    }

    #[test]
    fn test_org() {
        let isa = InstructionSet::packed();
        let out = layout("ORG 0x100\nstart: HLT\nORG 0x10\nlow: HLT", &isa).unwrap();
        assert_eq!(out.symbols.get("start"), Some(0x100));
        assert_eq!(out.symbols.get("low"), Some(0x10));
        assert_eq!(out.end, 0x11);
        assert_eq!(out.addresses, vec![0, 0x100, 0x100, 0x101, 0x10, 0x10]);
    }

    #[test]
    fn test_redefinition_overwrites() {
        let isa = InstructionSet::flat();
        let out = layout("x: NOP\nx: NOP", &isa).unwrap();
        assert_eq!(out.symbols.get("x"), Some(1));
        assert_eq!(out.symbols.len(), 1);
    }

    #[test]
    fn test_forward_use_is_not_an_error() {
        let isa = InstructionSet::flat();
        let out = layout("JMP nowhere", &isa).unwrap();
        assert!(out.symbols.is_empty());
    }

    #[test]
    fn test_unknown_mnemonic() {
        let isa = InstructionSet::flat();
        let err = layout("NOP\nFROB 1", &isa).unwrap_err();
        assert_eq!(err.line, Some(2));
        assert_eq!(err.kind, ErrorKind::UnknownMnemonic("FROB".to_string()));
    }

    #[test]
    fn test_label_past_address_space() {
        let isa = InstructionSet::flat();
        let err = layout("ORG 0xFFFF\nNOP\nlate:", &isa).unwrap_err();
        assert_eq!(err.line, Some(3));
        assert_eq!(err.kind, ErrorKind::OperandRange { value: 0x10000, max: 0xFFFF });
    }
}
