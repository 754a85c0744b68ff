//! Pass 2: turns statements into bytes.
//!
//! Label operands are written as placeholders and only replaced with
//! addresses once every statement has been encoded, so the order in which
//! labels are defined and used does not matter.
use super::ast::{Directive, Located, Operand, Statement};
use super::error::{AsmError, ErrorKind, Result};
use super::isa::{pack, Endian, InstructionSet, Opcode, OperandMode};
use super::layout::statement_size;
use super::symbols::SymbolTable;

/// Which part of a label's address belongs in a slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Placeholder {
    /// Low half of a 16-bit operand.
    LowByte(String),
    /// High half of a 16-bit operand.
    HighByte(String),
    /// A label used as a single-byte operand; the address is truncated.
    FullByte(String),
}

impl Placeholder {
    pub fn label(&self) -> &str {
        match self {
            Placeholder::LowByte(name) | Placeholder::HighByte(name) | Placeholder::FullByte(name) => name,
        }
    }

    pub fn resolve(&self, addr: u16) -> u8 {
        match self {
            Placeholder::LowByte(_) | Placeholder::FullByte(_) => (addr & 0xFF) as u8,
            Placeholder::HighByte(_) => (addr >> 8) as u8,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Slot {
    Byte(u8),
    Pending { placeholder: Placeholder, line: usize },
}

/// Output under construction. Writes go to the cursor: past the end they
/// append, inside the stream they overwrite.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ByteStream {
    slots: Vec<Slot>,
    cursor: usize,
}

impl ByteStream {
    pub fn new() -> Self {
        ByteStream { slots: Vec::new(), cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn write(&mut self, slot: Slot) {
        if self.cursor < self.slots.len() {
            self.slots[self.cursor] = slot;
        } else {
            self.slots.push(slot);
        }
        self.cursor += 1;
    }

    /// Moves the cursor to `addr`, zero-filling any gap past the end.
    pub fn seek(&mut self, addr: usize) {
        if addr > self.slots.len() {
            self.slots.resize(addr, Slot::Byte(0));
        }
        self.cursor = addr;
    }

    pub fn unresolved(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot, Slot::Pending { .. })).count()
    }

    /// Replaces every placeholder with its label's address bytes.
    /// Fails on the first label the table does not know.
    pub fn resolve(self, symbols: &SymbolTable) -> Result<Vec<u8>> {
        self.slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Byte(byte) => Ok(byte),
                Slot::Pending { placeholder, line } => match symbols.get(placeholder.label()) {
                    Some(addr) => Ok(placeholder.resolve(addr)),
                    None => Err(AsmError::from(ErrorKind::UndefinedLabel(placeholder.label().to_string())).at(line)),
                },
            })
            .collect()
    }
}

pub fn encode(statements: &[Located], isa: &InstructionSet) -> Result<ByteStream> {
    let mut encoder = Encoder { isa, stream: ByteStream::new(), line: 0 };

    for located in statements {
        encoder.line = located.line;
        let start = encoder.stream.cursor();
        encoder.statement(&located.statement).map_err(|e| e.at(located.line))?;

        if cfg!(debug_assertions) && !matches!(located.statement, Statement::Directive(Directive::Org(_))) {
            let expected = statement_size(&located.statement, isa)?;
            debug_assert_eq!(
                encoder.stream.cursor() - start,
                expected,
                "line {}: `{}` encoded to a different length than the layout reserved",
                located.line,
                located.statement
            );
        }
    }

    info!(
        "encode: {} byte(s), {} placeholder(s) pending",
        encoder.stream.len(),
        encoder.stream.unresolved()
    );
    Ok(encoder.stream)
}

struct Encoder<'a> {
    isa: &'a InstructionSet,
    stream: ByteStream,
    line: usize,
}

impl<'a> Encoder<'a> {
    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Label(_) => Ok(()),
            Statement::Directive(dir) => self.directive(dir),
            Statement::Instruction { mnemonic, operands } => self.instruction(mnemonic, operands),
        }
    }

    fn directive(&mut self, dir: &Directive) -> Result<()> {
        let mut out = Vec::with_capacity(dir.size());
        match dir {
            Directive::Byte(values) => {
                for value in values {
                    self.byte(value, true, &mut out)?;
                }
            }
            Directive::Word(values) => {
                for value in values {
                    self.word(value, true, Endian::Big, &mut out)?;
                }
            }
            Directive::Str(text) => {
                for c in text.chars() {
                    if c as u32 > 0xFF {
                        return Err(ErrorKind::OperandRange { value: c as u32, max: 0xFF }.into());
                    }
                    out.push(Slot::Byte(c as u8));
                }
            }
            Directive::Org(addr) => {
                let addr = *addr as usize;
                if addr > self.stream.len() {
                    debug!("ORG 0x{:04X}: padding {} byte(s)", addr, addr - self.stream.len());
                } else {
                    debug!("ORG 0x{:04X}: rewinding into emitted output", addr);
                }
                self.stream.seek(addr);
            }
        }
        self.flush(out);
        Ok(())
    }

    /// Operands are matched to the rule's modes in order. Every operand is
    /// checked before anything is written.
    fn instruction(&mut self, mnemonic: &str, operands: &[Operand]) -> Result<()> {
        let rule = *self.isa.lookup(mnemonic)?;
        debug!("line {}: {}", self.line, rule);
        let mut args = operands.iter().peekable();
        let mut register = 0;
        let mut tail = Vec::with_capacity(rule.size());

        for mode in rule.operands {
            match mode {
                OperandMode::RegisterPacked => {
                    if let Some(Operand::Register(idx)) = args.peek() {
                        register = *idx;
                        args.next();
                    }
                }
                OperandMode::ImmediateByte | OperandMode::LabelOrImmediateByte => {
                    let op = args.next().ok_or_else(|| ErrorKind::MissingOperand(rule.mnemonic.to_string()))?;
                    self.byte(op, *mode == OperandMode::LabelOrImmediateByte, &mut tail)?;
                }
                OperandMode::ImmediateWord | OperandMode::LabelOrImmediateWord => {
                    let op = args.next().ok_or_else(|| ErrorKind::MissingOperand(rule.mnemonic.to_string()))?;
                    self.word(op, *mode == OperandMode::LabelOrImmediateWord, rule.endian, &mut tail)?;
                }
            }
        }
        if let Some(extra) = args.next() {
            return Err(self.invalid(extra));
        }

        let first = |op: u8| if rule.packs_register() { pack(op, register) } else { op };
        let mut out = Vec::with_capacity(rule.size());
        match rule.opcode {
            Opcode::Base(op) => out.push(Slot::Byte(first(op))),
            Opcode::Prefixed { prefix, sub_opcode } => {
                out.push(Slot::Byte(first(prefix)));
                out.push(Slot::Byte(sub_opcode));
            }
        }
        out.append(&mut tail);
        self.flush(out);
        Ok(())
    }

    fn byte(&self, op: &Operand, labels: bool, out: &mut Vec<Slot>) -> Result<()> {
        match op {
            Operand::Immediate(val) => out.push(Slot::Byte(in_range(*val, 0xFF)? as u8)),
            Operand::Char(c) => out.push(Slot::Byte(*c)),
            Operand::Label(name) if labels => out.push(self.pending(Placeholder::FullByte(name.clone()))),
            _ => return Err(self.invalid(op)),
        }
        Ok(())
    }

    fn word(&self, op: &Operand, labels: bool, endian: Endian, out: &mut Vec<Slot>) -> Result<()> {
        let (hi, lo) = match op {
            Operand::Immediate(val) => {
                let [hi, lo] = (in_range(*val, 0xFFFF)? as u16).to_be_bytes();
                (Slot::Byte(hi), Slot::Byte(lo))
            }
            Operand::Char(c) => (Slot::Byte(0), Slot::Byte(*c)),
            Operand::Label(name) if labels => (
                self.pending(Placeholder::HighByte(name.clone())),
                self.pending(Placeholder::LowByte(name.clone())),
            ),
            _ => return Err(self.invalid(op)),
        };
        match endian {
            Endian::Big => out.extend(vec![hi, lo]),
            Endian::Little => out.extend(vec![lo, hi]),
        }
        Ok(())
    }

    fn pending(&self, placeholder: Placeholder) -> Slot {
        Slot::Pending { placeholder, line: self.line }
    }

    fn invalid(&self, op: &Operand) -> AsmError {
        let token = match op {
            Operand::Register(idx) => self.isa.register_name(*idx).map_or_else(|| op.to_string(), str::to_string),
            _ => op.to_string(),
        };
        ErrorKind::InvalidOperandSyntax(token).into()
    }

    fn flush(&mut self, slots: Vec<Slot>) {
        for slot in slots {
            self.stream.write(slot);
        }
    }
}

fn in_range(value: u32, max: u32) -> Result<u32> {
    if value <= max {
        Ok(value)
    } else {
        Err(ErrorKind::OperandRange { value, max }.into())
    }
}
