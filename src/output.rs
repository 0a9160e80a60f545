use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::machine::Machine;

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Debugger($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
    // Trigger type error if missing condition
    ( $fmt:literal $($tt:tt)* ) => {{
        $crate::output::Output::Debugger($fmt);
    }};
}

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Status messages on stdout
    Normal,
    /// Trace and machine dumps on stderr
    Debugger(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Sometimes,
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                if !Self::is_minimal() {
                    print!("{}", string);
                }
            }

            Self::Debugger(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => {
                    eprint!("{}", ColoredString::from(string).blue());
                }
                // Always remove color if `--minimal`
                (true, Condition::Always) => {
                    eprint_colorless(string);
                }
                (true, Condition::Sometimes) => (),
            },
        }
    }

    /// Right-aligned status line, e.g. `     Running target foo.ls8`.
    pub fn message(&self, color: MsgColor, left: &str, right: &str) {
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
            MsgColor::Red => left.red(),
        };
        self.print_str(&format!("{left:>12} {right}\n"));
    }

    pub fn print_registers(&self, machine: &Machine) {
        let regs = machine.registers().as_slice();
        if Self::is_minimal() {
            for (i, reg) in regs.iter().enumerate() {
                self.print_str(&format!("R{} {}\n", i, reg));
            }
            self.print_str(&format!("PC {}\n", machine.pc()));
            self.print_str(&format!("FL {:03b}\n", machine.flags()));
            return;
        }

        self.print_str("\x1b[2m┌─────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│     \x1b[3mhex  uint  binary\x1b[0m\x1b[2m   │\x1b[0m\n");
        for (i, reg) in regs.iter().enumerate() {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1mR{}\x1b[0m  ", i));
            self.print_str(&format!("0x{:02x}  {:>4}  {:08b}", reg, reg, reg));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1mPC\x1b[0m  0x{:02x}", machine.pc()));
        self.print_str(&format!("      \x1b[1mFL\x1b[0m  {:03b}", machine.flags()));
        self.print_str(" \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└─────────────────────────┘\x1b[0m\n");
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let plain: String = Decolored::new(string).collect();
    eprint!("{}", plain);
}
