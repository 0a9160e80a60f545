use std::num::ParseIntError;
use std::ops::Range;
use std::{fmt, io};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::loader::Source;

/// Fatal condition raised while executing a program.
///
/// None of these are recoverable: the run loop stops at the faulting instruction.
#[derive(Debug)]
pub enum MachineError {
    /// Instruction byte (or ALU selector) with no behaviour attached.
    UnsupportedOperation { opcode: u8, pc: usize },
    DivideByZero,
    AddressOutOfRange { address: usize },
    /// Push with the stack pointer at address 0.
    StackOverflow,
    /// Pop with the stack pointer at the last address.
    StackUnderflow,
    InvalidRegister { index: u8 },
    ProgramTooLarge { len: usize },
    /// Writing `PRN` output failed.
    Output(io::Error),
}

impl std::error::Error for MachineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOperation { opcode, pc } => {
                write!(f, "unsupported operation 0b{:08b} at address {}", opcode, pc)
            }
            Self::DivideByZero => write!(f, "division by zero"),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::AddressOutOfRange { address } => {
                write!(f, "address {} is outside of memory", address)
            }
            Self::InvalidRegister { index } => write!(f, "no such register: R{}", index),
            Self::ProgramTooLarge { len } => {
                write!(f, "program of {} bytes does not fit in memory", len)
            }
            Self::Output(e) => write!(f, "failed to write output: {}", e),
        }
    }
}

impl From<io::Error> for MachineError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

// Loader errors

pub fn load_bad_lit(span: Range<usize>, src: &Source, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_lit",
        help = "every instruction line must be a binary literal such as 10000010",
        labels = vec![LabeledSpan::at(span, "not a binary literal")],
        "Encountered an invalid literal: {e}",
    )
    .with_source_code(src.named())
}

pub fn load_too_large(span: Range<usize>, src: &Source) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = "each line holds exactly one byte, at most 8 binary digits",
        labels = vec![LabeledSpan::at(span, "value exceeds 255")],
        "Literal does not fit in a byte",
    )
    .with_source_code(src.named())
}

pub fn load_too_long(span: Range<usize>, src: &Source, max: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_long",
        help = format!("LS-8 memory holds {max} bytes, including the stack"),
        labels = vec![LabeledSpan::at(span, "first byte past the end of memory")],
        "Program is too long to fit in memory",
    )
    .with_source_code(src.named())
}
