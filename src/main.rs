use std::fs;
use std::path::{Path, PathBuf};

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use ls8::output::{MsgColor, Output};
use ls8::{RunEnvironment, Source};

/// ls8 runs programs for the LS-8, a small fictional 8-bit computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` file and print its output to the terminal
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print machine state before every instruction
        #[arg(short, long, env = "LS8_TRACE", value_parser = FalseyValueParser::new())]
        trace: bool,
        /// Stop the program after this many instructions
        #[arg(long, value_name = "N")]
        max_steps: Option<u64>,
    },
    /// Create binary `.bin` image to run later
    Compile {
        /// `.ls8` file to compile
        name: PathBuf,
        /// Destination to output `.bin` file
        dest: Option<PathBuf>,
    },
    /// Check a `.ls8` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                trace,
                max_steps,
            } => run(&name, minimal, trace, max_steps),
            Command::Compile { name, dest } => {
                file_message(Green, "Loading", &name);
                let program = load_text(&name)?;

                let out_file_name = match dest {
                    Some(dest) => dest,
                    None => match name.with_extension("bin").file_name() {
                        Some(file_name) => file_name.into(),
                        None => bail!("Cannot derive output name from {}", name.display()),
                    },
                };
                fs::write(&out_file_name, &program).into_diagnostic()?;

                Output::Normal.message(Green, "Finished", &format!("{} bytes", program.len()));
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let _ = load_text(&name)?;
                Output::Normal.message(Green, "Success", "no errors found!");
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false, false, None)
    } else {
        println!("\n~ ls8 v{VERSION} ~");
        println!("{}", LOGO.truecolor(120, 200, 255).bold());
        println!("{SHORT_INFO}");
        Ok(())
    }
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    Output::Normal.message(color, left, &right);
}

fn run(name: &Path, minimal: bool, trace: bool, max_steps: Option<u64>) -> Result<()> {
    Output::set_minimal(minimal);
    file_message(MsgColor::Green, "Loading", name);
    let program = match name.extension().and_then(|ext| ext.to_str()) {
        Some("ls8") => load_text(name)?,
        Some("bin") => fs::read(name).into_diagnostic()?,
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };

    let mut env = RunEnvironment::from_raw(&program)?;
    env.set_trace(trace);
    env.set_max_steps(max_steps);

    Output::Normal.message(MsgColor::Green, "Running", &format!("{} bytes", program.len()));
    if let Err(e) = env.run() {
        file_message(MsgColor::Red, "Failed", name);
        return Err(e);
    }

    Output::Normal.message(MsgColor::Cyan, "Halted", "");
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

/// Read and parse a textual `.ls8` program.
fn load_text(name: &Path) -> Result<Vec<u8>> {
    let contents = fs::read_to_string(name).into_diagnostic()?;
    let source = Source::new(name.display().to_string(), contents);
    ls8::loader::parse(&source)
}

const LOGO: &str = r#"
 _      ____        ___
| |    / ___|      ( _ )
| |    \___ \ _____/ _ \
| |___  ___) |_____| (_) |
|_____||____/      \___/"#;

const SHORT_INFO: &str = r"
Welcome to ls8, an interpreter for the LS-8 8-bit computer.
Programs are text files with one binary byte per line, e.g. `10000010 # LDI`.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
