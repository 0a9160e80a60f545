use std::num::IntErrorKind;
use std::ops::Range;

use miette::{NamedSource, Result};

use crate::error;
use crate::memory::MEMORY_SIZE;

/// Program text together with the name it is reported under.
#[derive(Clone, Debug)]
pub struct Source {
    name: String,
    src: String,
}

impl Source {
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        Source {
            name: name.into(),
            src: src.into(),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.src.clone())
    }
}

/// Translate `.ls8` text into program bytes.
///
/// Each significant line holds one binary literal; `#` starts a comment.
pub fn parse(source: &Source) -> Result<Vec<u8>> {
    let mut program = Vec::new();
    let mut offs = 0;

    for line in source.src().split_inclusive('\n') {
        let start = offs;
        offs += line.len();

        let code = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let literal = code.trim();
        if literal.is_empty() {
            continue;
        }
        // Span of the trimmed literal within the whole source
        let lit_start = start + (code.len() - code.trim_start().len());
        let span = lit_start..lit_start + literal.len();

        if program.len() == MEMORY_SIZE {
            return Err(error::load_too_long(span, source, MEMORY_SIZE));
        }
        program.push(parse_literal(literal, span, source)?);
    }
    Ok(program)
}

fn parse_literal(literal: &str, span: Range<usize>, source: &Source) -> Result<u8> {
    let digits = literal.strip_prefix("0b").unwrap_or(literal);
    let digits: String = digits.chars().filter(|&ch| ch != '_').collect();
    u8::from_str_radix(&digits, 2).map_err(|e| {
        if matches!(e.kind(), IntErrorKind::PosOverflow) {
            error::load_too_large(span, source)
        } else {
            error::load_bad_lit(span, source, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(src: &str) -> Result<Vec<u8>> {
        parse(&Source::new("test.ls8", src))
    }

    fn code(src: &str) -> Option<String> {
        load(src)
            .unwrap_err()
            .code()
            .map(|code| code.to_string())
    }

    #[test]
    fn print8() {
        let src = "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        assert_eq!(
            load(src).unwrap(),
            vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 1]
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let src = "\n   \n# only a comment\n\t00000001\t# HLT\r\n\n";
        assert_eq!(load(src).unwrap(), vec![1]);
        assert_eq!(load("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn prefix_and_separators() {
        assert_eq!(load("0b1000_0010\n1\n").unwrap(), vec![0x82, 1]);
    }

    #[test]
    fn rejects_bad_literal() {
        assert_eq!(code("00000001\n0000200\n").as_deref(), Some("load::bad_lit"));
        assert_eq!(code("LDI R0,8\n").as_deref(), Some("load::bad_lit"));
        assert_eq!(code("0b\n").as_deref(), Some("load::bad_lit"));
    }

    #[test]
    fn rejects_large_literal() {
        assert_eq!(code("100000000\n").as_deref(), Some("load::too_large"));
    }

    #[test]
    fn rejects_long_program() {
        let fits = "00000001\n".repeat(MEMORY_SIZE);
        assert_eq!(load(&fits).unwrap().len(), MEMORY_SIZE);

        let too_long = "00000001\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(code(&too_long).as_deref(), Some("load::too_long"));
    }

    #[test]
    fn labels_the_literal() {
        let report = load("00000001\n  12 # two\n").unwrap_err();
        let label = report.labels().unwrap().next().unwrap();
        assert_eq!(label.offset(), 11);
        assert_eq!(label.len(), 2);
    }
}
