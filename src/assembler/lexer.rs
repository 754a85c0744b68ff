//! This lexer splits source text into lines of raw tokens and classifies
//! operand tokens.
use regex::Regex;

use super::ast::Operand;
use super::error::{ErrorKind, Result};
use super::isa::InstructionSet;

/// `name:` at the start of a line, followed by the rest of the statement.
/// A name is any run of characters that cannot split an operand list.
const LABEL_PATTERN: &str = r#"^([^\s:;,"']+)\s*:(.*)$"#;

/// One non-blank source line, comment removed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    pub label: Option<String>,
    pub mnemonic: Option<String>,
    pub args: Vec<String>,
}

/// Splits the source into lines. Blank and comment-only lines are dropped.
pub fn tokenize(source: &str) -> Result<Vec<Line>> {
    let label_re = Regex::new(LABEL_PATTERN).expect("label pattern is a valid regex");
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        let (label, rest) = match label_re.captures(text) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str().to_string()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (None, text),
        };

        let mut tokens = split_args(rest).map_err(|e| e.at(number))?.into_iter();
        let mnemonic = tokens.next();
        lines.push(Line { number, label, mnemonic, args: tokens.collect() });
    }

    Ok(lines)
}

/// Cuts the line at the first `;` that is not inside a quoted literal.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, c) in line.char_indices() {
        match (quote, c) {
            (None, ';') => return &line[..idx],
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            _ => {}
        }
    }
    line
}

/// Splits on whitespace and commas. Quoted literals are kept whole,
/// quotes included.
fn split_args(text: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut sb = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        if let Some(q) = quote {
            sb.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                sb.push(c);
            }
            ',' => {
                if !sb.is_empty() {
                    out.push(sb.clone());
                    sb.clear();
                }
            }
            _ if c.is_whitespace() => {
                if !sb.is_empty() {
                    out.push(sb.clone());
                    sb.clear();
                }
            }
            _ => sb.push(c),
        }
    }

    if quote.is_some() {
        return Err(ErrorKind::InvalidOperandSyntax(sb).into());
    }
    if !sb.is_empty() {
        out.push(sb);
    }
    Ok(out)
}

/// Classifies an operand token. Registers win over labels of the same name.
/// A token that is not a register, number or character literal is a label
/// reference, since labels may be defined later in the file. Numbers too wide
/// for 32 bits saturate and fail the range check where they are used.
pub fn classify(token: &str, isa: &InstructionSet) -> Result<Operand> {
    if let Some(idx) = isa.register(token) {
        return Ok(Operand::Register(idx));
    }

    let number = match strip_radix_prefix(token, 'x') {
        Some(digits) => parse_number(digits, 16),
        None => match strip_radix_prefix(token, 'b') {
            Some(digits) => parse_number(digits, 2),
            None => parse_number(token, 10),
        },
    };
    if let Some(value) = number {
        return Ok(Operand::Immediate(value));
    }

    match unquote(token) {
        Some(inner) => {
            let mut chars = inner.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if (c as u32) <= 0xFF => Ok(Operand::Char(c as u8)),
                (Some(c), None) => Err(ErrorKind::OperandRange { value: c as u32, max: 0xFF }.into()),
                _ => Ok(Operand::Label(token.to_string())),
            }
        }
        None if token.contains(|c: char| c == '"' || c == '\'') => {
            Err(ErrorKind::InvalidOperandSyntax(token.to_string()).into())
        }
        None => Ok(Operand::Label(token.to_string())),
    }
}

/// Returns the text between matching single or double quotes.
pub fn unquote(token: &str) -> Option<&str> {
    let quote = token.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if token.len() >= 2 && token.ends_with(quote) {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

fn strip_radix_prefix(token: &str, radix: char) -> Option<&str> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), Some(c)) if c.to_ascii_lowercase() == radix => Some(&token[2..]),
        _ => None,
    }
}

/// Digits only, no sign. Overflow saturates to `u32::MAX`.
fn parse_number(digits: &str, radix: u32) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    Some(u32::from_str_radix(digits, radix).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("LIA 5 ; load"), "LIA 5 ");
        assert_eq!(strip_comment("; only a comment"), "");
        assert_eq!(strip_comment(".STR \"a;b\" ; c"), ".STR \"a;b\" ");
        assert_eq!(strip_comment("DB ';', 1"), "DB ';', 1");
        assert_eq!(strip_comment("NOP"), "NOP");
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("LDI A, 0x56"), Ok(strings(&["LDI", "A", "0x56"])));
        assert_eq!(split_args("LDI \t\tA,,\t 0x56"), Ok(strings(&["LDI", "A", "0x56"])));
        assert_eq!(split_args("LDI A,0x56"), Ok(strings(&["LDI", "A", "0x56"])));
        assert_eq!(split_args(".STR \"hello,  world\""), Ok(strings(&[".STR", "\"hello,  world\""])));
        assert_eq!(split_args("DB ' ', ','"), Ok(strings(&["DB", "' '", "','"])));
        assert_eq!(split_args(""), Ok(vec![]));
        assert_eq!(
            split_args(".STR \"open").unwrap_err().kind,
            ErrorKind::InvalidOperandSyntax("\"open".to_string())
        );
    }

    #[test]
    fn test_tokenize() {
        let src = "
        start:  LDI Z, 3   ; three
                HLT

        end:
        msg: .STR \"a: b\"
        my-label: DB ':'
        ";
        let lines = tokenize(src).unwrap();
        assert_eq!(
            lines,
            vec![
                Line {
                    number: 2,
                    label: Some("start".to_string()),
                    mnemonic: Some("LDI".to_string()),
                    args: strings(&["Z", "3"]),
                },
                Line { number: 3, label: None, mnemonic: Some("HLT".to_string()), args: vec![] },
                Line { number: 5, label: Some("end".to_string()), mnemonic: None, args: vec![] },
                Line {
                    number: 6,
                    label: Some("msg".to_string()),
                    mnemonic: Some(".STR".to_string()),
                    args: strings(&["\"a: b\""]),
                },
                Line {
                    number: 7,
                    label: Some("my-label".to_string()),
                    mnemonic: Some("DB".to_string()),
                    args: strings(&["':'"]),
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_reports_line() {
        let err = tokenize("NOP\nDB 'x").unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_classify_register() {
        let isa = InstructionSet::packed();
        assert_eq!(classify("A", &isa), Ok(Operand::Register(0)));
        assert_eq!(classify("c", &isa), Ok(Operand::Register(2)));
        assert_eq!(classify("Z", &isa), Ok(Operand::Register(7)));

        // The flat ISA has no register operands.
        let isa = InstructionSet::flat();
        assert_eq!(classify("A", &isa), Ok(Operand::Label("A".to_string())));
    }

    #[test]
    fn test_classify_numbers() {
        let isa = InstructionSet::packed();
        for i in 0..=u8::MAX as u32 {
            assert_eq!(classify(&format!("{}", i), &isa), Ok(Operand::Immediate(i)));
            assert_eq!(classify(&format!("0x{:x}", i), &isa), Ok(Operand::Immediate(i)));
            assert_eq!(classify(&format!("0X{:X}", i), &isa), Ok(Operand::Immediate(i)));
            assert_eq!(classify(&format!("0b{:b}", i), &isa), Ok(Operand::Immediate(i)));
        }
        assert_eq!(classify("65535", &isa), Ok(Operand::Immediate(65535)));
        // Range is checked by whoever uses the value.
        assert_eq!(classify("0x10000", &isa), Ok(Operand::Immediate(0x10000)));
        assert_eq!(classify("010", &isa), Ok(Operand::Immediate(10)));

        assert_eq!(classify("99999999999", &isa), Ok(Operand::Immediate(u32::MAX)));

        // Not a well-formed number, so it can only name a label.
        for token in &["0xZZ", "0x", "0b102", "12ab", "0x+5", "0b+1", "+7"] {
            assert_eq!(classify(token, &isa), Ok(Operand::Label(token.to_string())));
        }
    }

    #[test]
    fn test_classify_char() {
        let isa = InstructionSet::flat();
        assert_eq!(classify("'A'", &isa), Ok(Operand::Char(0x41)));
        assert_eq!(classify("\"z\"", &isa), Ok(Operand::Char(b'z')));
        assert_eq!(classify("' '", &isa), Ok(Operand::Char(b' ')));
        assert_eq!(classify("''", &isa), Ok(Operand::Label("''".to_string())));
        assert_eq!(classify("'AB'", &isa), Ok(Operand::Label("'AB'".to_string())));
        assert_eq!(
            classify("'a'b", &isa).unwrap_err().kind,
            ErrorKind::InvalidOperandSyntax("'a'b".to_string())
        );
        assert_eq!(
            classify("'\u{263A}'", &isa).unwrap_err().kind,
            ErrorKind::OperandRange { value: 0x263A, max: 0xFF }
        );
    }

    #[test]
    fn test_classify_label() {
        let isa = InstructionSet::packed();
        assert_eq!(classify("loop", &isa), Ok(Operand::Label("loop".to_string())));
        assert_eq!(classify("_end.1", &isa), Ok(Operand::Label("_end.1".to_string())));
        assert_eq!(classify("AB", &isa), Ok(Operand::Label("AB".to_string())));
        assert_eq!(classify("my-label", &isa), Ok(Operand::Label("my-label".to_string())));
        assert_eq!(classify("-1", &isa), Ok(Operand::Label("-1".to_string())));
        assert_eq!(classify("a+b", &isa), Ok(Operand::Label("a+b".to_string())));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"AB\""), Some("AB"));
        assert_eq!(unquote("'x'"), Some("x"));
        assert_eq!(unquote("\"\""), Some(""));
        assert_eq!(unquote("\"AB'"), None);
        assert_eq!(unquote("\""), None);
        assert_eq!(unquote("AB"), None);
    }
}
