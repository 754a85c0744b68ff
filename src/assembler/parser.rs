//! The Parser module takes the lines produced by the lexer and converts
//! them into a flat list of statements.
use std::collections::VecDeque;

use super::ast::*;
use super::error::{ErrorKind, Result};
use super::isa::InstructionSet;
use super::lexer::{classify, unquote, Line};

pub struct Parser<'a> {
    lines: VecDeque<Line>,
    isa: &'a InstructionSet,
    statements: Vec<Located>,
}

impl<'a> Parser<'a> {
    pub fn new(lines: Vec<Line>, isa: &'a InstructionSet) -> Self {
        let capacity = lines.len();
        Parser { lines: VecDeque::from(lines), isa, statements: Vec::with_capacity(capacity) }
    }

    /// Run the parser, consuming itself and returning the statements in
    /// source order. Stops at the first error.
    pub fn run(mut self) -> Result<Vec<Located>> {
        while let Some(line) = self.consume() {
            let number = line.number;
            self.line(line).map_err(|e| e.at(number))?;
        }

        debug!("parsed {} statement(s)", self.statements.len());
        Ok(self.statements)
    }

    /// A label always comes before the statement on its line, so it binds
    /// to that statement's address.
    fn line(&mut self, line: Line) -> Result<()> {
        if let Some(label) = line.label {
            self.push(line.number, Statement::Label(label));
        }
        if let Some(mnemonic) = line.mnemonic {
            let statement = self.statement(&mnemonic, &line.args)?;
            self.push(line.number, statement);
        }
        Ok(())
    }

    fn statement(&self, mnemonic: &str, args: &[String]) -> Result<Statement> {
        let name = mnemonic.to_ascii_uppercase();
        match name.as_str() {
            ".BYTE" | "DB" => {
                let values = self.values(&name, args)?;
                Ok(Statement::Directive(Directive::Byte(values)))
            }
            ".WORD" | "DW" => {
                let values = self.values(&name, args)?;
                Ok(Statement::Directive(Directive::Word(values)))
            }
            ".STR" => self.string(&name, args),
            "ORG" => self.origin(&name, args),
            _ => Ok(Statement::Instruction { mnemonic: name, operands: self.operands(args)? }),
        }
    }

    fn operands(&self, args: &[String]) -> Result<Vec<Operand>> {
        args.iter().map(|arg| classify(arg, self.isa)).collect()
    }

    /// Data directives need at least one value.
    fn values(&self, name: &str, args: &[String]) -> Result<Vec<Operand>> {
        if args.is_empty() {
            return Err(ErrorKind::MissingOperand(name.to_string()).into());
        }
        self.operands(args)
    }

    fn string(&self, name: &str, args: &[String]) -> Result<Statement> {
        match args {
            [] => Err(ErrorKind::MissingOperand(name.to_string()).into()),
            [literal] => match unquote(literal) {
                Some(text) => Ok(Statement::Directive(Directive::Str(text.to_string()))),
                None => Err(ErrorKind::InvalidOperandSyntax(literal.clone()).into()),
            },
            [_, extra, ..] => Err(ErrorKind::InvalidOperandSyntax(extra.clone()).into()),
        }
    }

    fn origin(&self, name: &str, args: &[String]) -> Result<Statement> {
        let arg = match args {
            [] => return Err(ErrorKind::MissingOperand(name.to_string()).into()),
            [arg] => arg,
            [_, extra, ..] => return Err(ErrorKind::InvalidOperandSyntax(extra.clone()).into()),
        };
        match classify(arg, self.isa)? {
            Operand::Immediate(addr) if addr <= 0xFFFF => Ok(Statement::Directive(Directive::Org(addr as u16))),
            Operand::Immediate(addr) => Err(ErrorKind::OperandRange { value: addr, max: 0xFFFF }.into()),
            _ => Err(ErrorKind::InvalidOperandSyntax(arg.clone()).into()),
        }
    }

    fn push(&mut self, line: usize, statement: Statement) {
        self.statements.push(Located { line, statement });
    }

    /// Pops a line off the input and returns it.
    /// Returns None if no lines are left.
    #[inline]
    fn consume(&mut self) -> Option<Line> {
        self.lines.pop_front()
    }
}
