use std::cmp::Ordering;
use std::fmt::Write as _;
use std::io::Write;

use crate::alu;
use crate::error::MachineError;
use crate::memory::Memory;
use crate::opcode::{ControlOp, DataOp, Instruction, Opcode};

pub const REGISTER_COUNT: usize = 8;
/// Register holding the stack pointer, by convention.
pub const SP: u8 = 7;
/// Initial stack pointer. The stack grows down from here.
pub const SP_INIT: u8 = 0xF4;

/// Execution state of the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// Result of the last `CMP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    Less = 0b100,
    Greater = 0b010,
    Equal = 0b001,
    Uninit = 0b000,
}

impl From<Ordering> for Flag {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Less => Flag::Less,
            Ordering::Greater => Flag::Greater,
            Ordering::Equal => Flag::Equal,
        }
    }
}

impl Flag {
    pub fn is_equal(self) -> bool {
        self as u8 & Flag::Equal as u8 != 0
    }
}

/// 8x 8-bit general purpose registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers([u8; REGISTER_COUNT]);

impl Default for Registers {
    fn default() -> Self {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP as usize] = SP_INIT;
        Registers(reg)
    }
}

impl Registers {
    pub fn get(&self, index: u8) -> Result<u8, MachineError> {
        self.0
            .get(index as usize)
            .copied()
            .ok_or(MachineError::InvalidRegister { index })
    }

    pub fn get_mut(&mut self, index: u8) -> Result<&mut u8, MachineError> {
        self.0
            .get_mut(index as usize)
            .ok_or(MachineError::InvalidRegister { index })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Complete LS-8 state: memory, registers, program counter and flags.
#[derive(Clone, Debug)]
pub struct Machine {
    mem: Memory,
    reg: Registers,
    /// Program counter
    pc: usize,
    flag: Flag,
    state: State,
    /// Instructions executed so far
    steps: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            mem: Memory::new(),
            reg: Registers::default(),
            pc: 0,
            flag: Flag::Uninit,
            state: State::Running,
            steps: 0,
        }
    }

    pub fn with_program(program: &[u8]) -> Result<Self, MachineError> {
        let mut machine = Self::new();
        machine.load_program(program)?;
        Ok(machine)
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MachineError> {
        self.mem.load_program(program)
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Raw flags register.
    pub fn flags(&self) -> u8 {
        self.flag as u8
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn register(&self, index: u8) -> Result<u8, MachineError> {
        self.reg.get(index)
    }

    pub fn set_register(&mut self, index: u8, value: u8) -> Result<(), MachineError> {
        *self.reg.get_mut(index)? = value;
        Ok(())
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Run until `HLT`, writing `PRN` output to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), MachineError> {
        while self.step(out)? == State::Running {}
        Ok(())
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// On error the PC still points at the faulting instruction.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<State, MachineError> {
        if self.is_halted() {
            return Ok(State::Halted);
        }
        let instr = Instruction::new(self.mem.read(self.pc)?);
        let opcode = instr.decode(self.pc)?;
        let (a, b) = self.operands(instr)?;
        let next = self.pc + instr.width();

        let jumped = match opcode {
            Opcode::Alu(op) => {
                alu::execute(op, a, b, &mut self.reg, &mut self.flag)?;
                false
            }
            Opcode::Control(op) => self.control(op, a, next)?,
            Opcode::Data(op) => {
                self.data(op, a, b, out)?;
                false
            }
        };
        if !jumped {
            self.pc = next;
        }
        self.steps += 1;
        Ok(self.state)
    }

    /// Read the operand bytes declared by the instruction. Undeclared operands are zero.
    fn operands(&self, instr: Instruction) -> Result<(u8, u8), MachineError> {
        let mut operands = [0; 2];
        for (i, operand) in operands
            .iter_mut()
            .enumerate()
            .take(instr.operand_count())
        {
            *operand = self.mem.read(self.pc + 1 + i)?;
        }
        Ok((operands[0], operands[1]))
    }

    /// Returns `true` if the PC was set.
    fn control(&mut self, op: ControlOp, a: u8, next: usize) -> Result<bool, MachineError> {
        let target = match op {
            ControlOp::CALL => {
                let ret = u8::try_from(next)
                    .map_err(|_| MachineError::AddressOutOfRange { address: next })?;
                // Validate before touching the stack; the target is read after the push
                self.reg.get(a)?;
                self.push_val(ret)?;
                self.reg.get(a)?
            }
            ControlOp::RET => self.pop_val()?,
            ControlOp::JMP => self.reg.get(a)?,
            ControlOp::JEQ if self.flag.is_equal() => self.reg.get(a)?,
            ControlOp::JNE if !self.flag.is_equal() => self.reg.get(a)?,
            ControlOp::JEQ | ControlOp::JNE => return Ok(false),
        };
        self.pc = target as usize;
        Ok(true)
    }

    fn data<W: Write>(&mut self, op: DataOp, a: u8, b: u8, out: &mut W) -> Result<(), MachineError> {
        match op {
            DataOp::HLT => self.state = State::Halted,
            DataOp::LDI => *self.reg.get_mut(a)? = b,
            DataOp::PRN => writeln!(out, "{}", self.reg.get(a)?)?,
            DataOp::PUSH => {
                let val = self.reg.get(a)?;
                self.push_val(val)?;
            }
            DataOp::POP => {
                self.reg.get(a)?;
                let val = self.pop_val()?;
                *self.reg.get_mut(a)? = val;
            }
        }
        Ok(())
    }

    fn push_val(&mut self, val: u8) -> Result<(), MachineError> {
        let sp = self.reg.get_mut(SP)?;
        // Decrement stack
        *sp = sp.checked_sub(1).ok_or(MachineError::StackOverflow)?;
        let addr = *sp as usize;
        self.mem.write(addr, val)
    }

    fn pop_val(&mut self) -> Result<u8, MachineError> {
        let sp = self.reg.get_mut(SP)?;
        let addr = *sp as usize;
        *sp = sp.checked_add(1).ok_or(MachineError::StackUnderflow)?;
        self.mem.read(addr)
    }

    /// One-line dump of PC, the next instruction's bytes and all registers.
    pub fn trace(&self) -> String {
        let byte_at = |addr: usize| match self.mem.read(addr) {
            Ok(byte) => format!("{byte:02X}"),
            Err(_) => "--".to_owned(),
        };
        let mut line = format!(
            "TRACE: {:02X} | {} {} {} |",
            self.pc,
            byte_at(self.pc),
            byte_at(self.pc + 1),
            byte_at(self.pc + 2),
        );
        for reg in self.reg.as_slice() {
            let _ = write!(line, " {reg:02X}");
        }
        let mnemonic = self
            .mem
            .read(self.pc)
            .ok()
            .and_then(|byte| Instruction::new(byte).decode(self.pc).ok());
        match mnemonic {
            Some(opcode) => {
                let _ = write!(line, " | {opcode}");
            }
            None => line.push_str(" | ???"),
        }
        line
    }
}
