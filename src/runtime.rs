use std::io::{stdout, Write};

use miette::{miette, Result};

use crate::dprintln;
use crate::error::MachineError;
use crate::machine::{Machine, State};
use crate::output::{Condition, Output};

/// Machine plus the options it is run with from the command line.
pub struct RunEnvironment {
    machine: Machine,
    trace: bool,
    max_steps: Option<u64>,
}

impl RunEnvironment {
    pub fn from_raw(program: &[u8]) -> Result<RunEnvironment> {
        let machine = Machine::with_program(program).map_err(|e| miette!("{e}"))?;
        Ok(RunEnvironment {
            machine,
            trace: false,
            max_steps: None,
        })
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Stop a program that has not halted after `max_steps` instructions.
    pub fn set_max_steps(&mut self, max_steps: Option<u64>) {
        self.max_steps = max_steps;
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Run to completion with `PRN` output on stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdout = stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out)
    }

    pub fn run_with<W: Write>(&mut self, out: &mut W) -> Result<()> {
        loop {
            if self.max_steps.is_some_and(|max| self.machine.steps() >= max) {
                Output::Debugger(Condition::Sometimes).print_registers(&self.machine);
                return Err(miette!(
                    code = "run::step_limit",
                    help = "raise `--max-steps` if the program needs longer to finish",
                    "Program did not halt within {} steps",
                    self.machine.steps()
                ));
            }
            if self.trace {
                dprintln!(Always, "{}", self.machine.trace());
            }
            match self.machine.step(out) {
                Ok(State::Running) => (),
                Ok(State::Halted) => {
                    return out.flush().map_err(|e| {
                        let e = MachineError::Output(e);
                        miette!(code = "run::output", "{e}")
                    });
                }
                Err(e) => {
                    let pc = self.machine.pc();
                    Output::Debugger(Condition::Always).print_registers(&self.machine);
                    return Err(miette!(
                        code = "run::fault",
                        "Machine fault at address 0x{pc:02x}: {e}"
                    ));
                }
            }
        }
    }
}
