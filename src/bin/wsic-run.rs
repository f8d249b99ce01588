use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wsic_rs::{exec::IntExecutor, isa::sic::SicDecoder, load_bytes, Cpu, CpuConfig, LinearMemory, StdConsole};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Load a WSIC object program and run it on the wsic-rs interpreter"
)]
struct Opts {
    /// Load address added to every relocatable address
    #[arg(short, long, value_parser = parse_u32, default_value = "0")]
    base: u32,
    /// Stop with an error after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
    /// CPU configuration as JSON (see `CpuConfig`)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the final register file as JSON on stderr
    #[arg(long)]
    dump_regs: bool,
    #[arg(value_name = "OBJFILE")]
    input: PathBuf,
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => t.parse::<u32>(),
    };
    parsed.map_err(|e| format!("bad address {s:?}: {e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let mut cfg = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<CpuConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => CpuConfig {
            max_steps: Some(10_000_000),
            ..CpuConfig::default()
        },
    };
    if opts.max_steps.is_some() {
        cfg.max_steps = opts.max_steps;
    }

    let image = std::fs::read(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let mut mem = LinearMemory::new(cfg.memory_size);
    let prog = load_bytes(&mut mem, &image, opts.base)
        .with_context(|| format!("loading {}", opts.input.display()))?;
    eprintln!(
        "Exec address: {:06X}, Terminal address: {:06X}",
        prog.exec_address, prog.terminal_address
    );

    let mut cpu = Cpu::new(cfg);
    cpu.reset(prog.exec_address);

    let dec = SicDecoder::new();
    let exec = IntExecutor;
    let result = cpu.run(&mut mem, &dec, &exec, &mut StdConsole, prog.terminal_address);

    if opts.dump_regs {
        eprintln!("{}", serde_json::to_string_pretty(&cpu)?);
    }
    let halt = result?;
    eprintln!("Stopped: {halt:?}");
    Ok(())
}
