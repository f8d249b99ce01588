use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wsic_dump::{disasm_listing, header, load_object, record_listing};

#[derive(Parser, Debug)]
#[command(author, version, about = "WSIC object file dump tool", long_about=None)]
struct Cli {
    /// Input object file
    #[arg(value_name = "OBJFILE")]
    input: PathBuf,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every record in file order
    Records {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Disassemble the text records
    Disasm {
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let obj = load_object(&cli.input)?;

    match cli.cmd {
        Command::Records { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&obj)?);
            } else {
                for line in record_listing(&obj) {
                    println!("{line}");
                }
                if obj.trailing > 0 {
                    println!("({} trailing byte(s) not decoded)", obj.trailing);
                }
            }
        }
        Command::Disasm { show_bytes, out } => {
            let mut text = String::new();
            if let Some((name, start, length)) = header(&obj) {
                text.push_str(&format!("; {name} start {start:06X} length {length:06X}\n"));
            }
            for line in disasm_listing(&obj, show_bytes) {
                text.push_str(&line);
                text.push('\n');
            }
            match out {
                Some(path) => std::fs::write(path, text)?,
                None => print!("{text}"),
            }
        }
    }
    Ok(())
}
