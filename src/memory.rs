use crate::error::MachineError;

/// LS-8 can address 256 bytes of memory.
pub const MEMORY_SIZE: usize = 0x100;

/// Flat, zero-initialised byte memory.
#[derive(Clone, Debug)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, address: usize) -> Result<u8, MachineError> {
        self.cells
            .get(address)
            .copied()
            .ok_or(MachineError::AddressOutOfRange { address })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), MachineError> {
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(MachineError::AddressOutOfRange { address })?;
        *cell = value;
        Ok(())
    }

    /// Copy `program` to the start of memory. Cells past the end of the program are untouched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MachineError> {
        if program.len() > MEMORY_SIZE {
            return Err(MachineError::ProgramTooLarge { len: program.len() });
        }
        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}
