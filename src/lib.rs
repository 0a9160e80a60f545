// Loading
pub mod loader;
pub use loader::Source;

// Running
pub mod alu;
pub mod machine;
pub use machine::{Machine, State};
pub mod memory;
pub mod opcode;
mod runtime;
pub use runtime::RunEnvironment;

pub mod output;

pub mod error;
pub use error::MachineError;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
