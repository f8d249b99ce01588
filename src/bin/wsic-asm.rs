use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wsic_rs::asm::{first_pass, second_pass, tokenize};
use wsic_rs::encode_program;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble a WSIC program into an object file")]
struct Opts {
    /// Input assembly file (one statement per line, `#` comments)
    #[arg(value_name = "SRCFILE")]
    input: PathBuf,
    /// Output object file
    #[arg(short, long, default_value = "output.obj")]
    output: PathBuf,
    /// Print the symbol table on stderr
    #[arg(long)]
    symbols: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let fp = first_pass(tokenize(&text))
        .with_context(|| format!("assembling {}", opts.input.display()))?;
    if opts.symbols {
        if fp.symtab.is_empty() {
            eprintln!("(no symbols)");
        }
        for (name, addr) in fp.symtab.sorted() {
            eprintln!("{name:<6} {addr:06X}");
        }
    }
    let records = second_pass(&fp).with_context(|| format!("assembling {}", opts.input.display()))?;
    let bin = encode_program(&records)?;
    fs::write(&opts.output, &bin).with_context(|| format!("writing {}", opts.output.display()))?;
    Ok(())
}
