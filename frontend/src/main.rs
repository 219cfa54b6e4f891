use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use tstate_core::core::machine::Machine;
use tstate_machines::{ProgramImage, registry};

mod config;
mod logger;
mod runner;

use config::Config;

#[derive(Parser)]
#[command(name = "tstate", about = "Half-clock accurate Z80 bench runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a raw program image into a board and clock it until HALT
    Run(RunArgs),
    /// List the available boards
    Machines,
}

#[derive(Args)]
struct RunArgs {
    /// Raw binary to load
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Board to run on (see `tstate machines`)
    #[arg(short, long)]
    machine: Option<String>,

    /// Address the image is copied to (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_address)]
    load_address: Option<u16>,

    /// Full clock cycles to run before giving up
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Clock cycles RESET is held at power-on
    #[arg(long)]
    reset_cycles: Option<u32>,

    /// Settings file (defaults to <config dir>/tstate/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

impl RunArgs {
    /// Command-line values win over the settings file.
    fn apply(&self, config: &mut Config) {
        if let Some(machine) = &self.machine {
            config.machine = machine.clone();
        }
        if let Some(addr) = self.load_address {
            config.load_address = addr;
        }
        if let Some(cycles) = self.max_cycles {
            config.max_cycles = cycles;
        }
        if let Some(cycles) = self.reset_cycles {
            config.reset_cycles = cycles;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

fn list_machines() {
    for entry in registry::all() {
        println!("{:<10} {}", entry.name, entry.description);
    }
}

fn run(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    logger::init(config.log_level)?;

    let entry = registry::find(&config.machine).ok_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        format!(
            "unknown machine '{}' (available: {})",
            config.machine,
            names.join(", ")
        )
    })?;

    let image = ProgramImage::from_file(&args.image, config.load_address)?;
    log::info!(
        "{}: {} bytes at 0x{:04X}, crc32 {:08x}",
        args.image.display(),
        image.len(),
        image.load_address(),
        image.crc32()
    );

    let mut machine = (entry.create)(config.quirks.into());
    machine.load(image.load_address(), image.bytes());
    machine.power_on(config.reset_cycles);

    let mut stdout = std::io::stdout().lock();
    let outcome = runner::run(machine.as_mut(), config.max_cycles, &mut stdout)?;
    runner::write_report(&mut std::io::stderr().lock(), machine.as_ref(), &outcome)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Machines => {
            list_machines();
            ExitCode::SUCCESS
        }
        Command::Run(args) => match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
