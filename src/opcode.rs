//! Instruction byte layout.
//!
//! ```text
//! AABCDDDD
//!   AA   number of operand bytes following the instruction
//!   B    ALU operation
//!   C    instruction sets the PC itself
//!   DDDD instruction identifier
//! ```

use std::fmt;

use crate::error::MachineError;

const OPERANDS_SHIFT: u8 = 6;
const ALU_BIT: u8 = 0b0010_0000;
const SETS_PC_BIT: u8 = 0b0001_0000;

/// Generates a `#[repr(u8)]` opcode enum with byte conversions and mnemonics.
macro_rules! opcodes {
    ( $(#[$meta:meta])* $name:ident { $( $variant:ident = $byte:literal ),* $(,)? } ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $( $variant = $byte, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )*
                }
            }

            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $( $byte => Some($name::$variant), )*
                    _ => None,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    };
}

opcodes! {
    /// Arithmetic, logic and comparison performed by the ALU.
    #[allow(clippy::upper_case_acronyms)]
    AluOp {
        ADD = 0b1010_0000,
        MUL = 0b1010_0010,
        MOD = 0b1010_0100,
        CMP = 0b1010_0111,
        AND = 0b1010_1000,
        NOT = 0b0110_1001,
        OR = 0b1010_1010,
        XOR = 0b1010_1011,
        SHL = 0b1010_1100,
        SHR = 0b1010_1101,
    }
}

opcodes! {
    /// Instructions responsible for their own PC update.
    #[allow(clippy::upper_case_acronyms)]
    ControlOp {
        CALL = 0b0101_0000,
        RET = 0b0001_0001,
        JMP = 0b0101_0100,
        JEQ = 0b0101_0101,
        JNE = 0b0101_0110,
    }
}

opcodes! {
    /// Data movement, stack, output and halt.
    #[allow(clippy::upper_case_acronyms)]
    DataOp {
        HLT = 0b0000_0001,
        LDI = 0b1000_0010,
        PRN = 0b0100_0111,
        PUSH = 0b0100_0101,
        POP = 0b0100_0110,
    }
}

/// Opcode resolved after checking the structural bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Alu(AluOp),
    Control(ControlOp),
    Data(DataOp),
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alu(op) => op.fmt(f),
            Self::Control(op) => op.fmt(f),
            Self::Data(op) => op.fmt(f),
        }
    }
}

/// Structural view of an instruction byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    byte: u8,
}

impl Instruction {
    pub fn new(byte: u8) -> Self {
        Instruction { byte }
    }

    pub fn byte(self) -> u8 {
        self.byte
    }

    /// Operand bytes encoded in bits 7-6.
    pub fn operand_count(self) -> usize {
        (self.byte >> OPERANDS_SHIFT) as usize
    }

    /// Distance to the next instruction when the PC is not set explicitly.
    pub fn width(self) -> usize {
        1 + self.operand_count()
    }

    pub fn is_alu(self) -> bool {
        self.byte & ALU_BIT != 0
    }

    pub fn sets_pc(self) -> bool {
        self.byte & SETS_PC_BIT != 0
    }

    /// Resolve the opcode. The ALU bit is checked before the PC bit.
    pub fn decode(self, pc: usize) -> Result<Opcode, MachineError> {
        let unsupported = MachineError::UnsupportedOperation {
            opcode: self.byte,
            pc,
        };
        let opcode = if self.is_alu() {
            AluOp::from_byte(self.byte).map(Opcode::Alu)
        } else if self.sets_pc() {
            ControlOp::from_byte(self.byte).map(Opcode::Control)
        } else {
            DataOp::from_byte(self.byte).map(Opcode::Data)
        };
        opcode.ok_or(unsupported)
    }
}
