use anyhow::{Context, Result};
use aztag_core::{CardInfo, Dump, decipher, derive_key, encipher, inspect};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aztag-cli")]
#[command(about = "Aztek tag dump (de|en)cipher – CLI tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decipher a raw card dump to its clear-text image
    Decipher {
        /// Path to the raw card dump (eml text)
        dump: PathBuf,

        /// Path to write the clear-text image
        out_clear: PathBuf,
    },

    /// Encipher a clear-text image and rewrite its checksum zones
    Encipher {
        /// Path to the clear-text image
        clear: PathBuf,

        /// Path to write the raw card dump
        out_dump: PathBuf,
    },

    /// Decode and verify the wallet payload of a raw card dump
    Info {
        /// Path to the raw card dump (eml text)
        dump: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decipher { dump, out_clear } => {
            cmd_decipher(&dump, &out_clear)?;
        }
        Commands::Encipher { clear, out_dump } => {
            cmd_encipher(&clear, &out_dump)?;
        }
        Commands::Info { dump } => {
            cmd_info(&dump)?;
        }
    }

    Ok(())
}

fn read_dump(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read dump file: {}", path.display()))
}

fn print_key_info(text: &str) -> Result<()> {
    let dump = Dump::parse(text)?;
    let key = derive_key(dump.uid())?;
    println!("[info] UID {}", dump.uid());
    println!(
        "[info] XTEA key {:08X} {:08X} {:08X} {:08X}",
        key[0], key[1], key[2], key[3]
    );
    Ok(())
}

fn cmd_decipher(dump_path: &PathBuf, out_clear_path: &PathBuf) -> Result<()> {
    let text = read_dump(dump_path)?;
    print_key_info(&text)?;

    let clear = decipher(&text)?;

    fs::write(out_clear_path, &clear)
        .with_context(|| format!("Failed to write clear image: {}", out_clear_path.display()))?;

    println!("[ok] wrote clear image -> {}", out_clear_path.display());

    Ok(())
}

fn cmd_encipher(clear_path: &PathBuf, out_dump_path: &PathBuf) -> Result<()> {
    let text = read_dump(clear_path)?;
    print_key_info(&text)?;

    let enciphered = encipher(&text)?;

    fs::write(out_dump_path, &enciphered)
        .with_context(|| format!("Failed to write card dump: {}", out_dump_path.display()))?;

    println!("[ok] wrote card dump -> {}", out_dump_path.display());

    Ok(())
}

fn cmd_info(dump_path: &PathBuf) -> Result<()> {
    let text = read_dump(dump_path)?;
    let info = inspect(&text)?;
    print_card_info(&info);
    Ok(())
}

fn print_card_info(info: &CardInfo) {
    println!("[info] UID {}", info.uid);
    println!(
        "[info] XTEA key {:08X} {:08X} {:08X} {:08X}",
        info.key[0], info.key[1], info.key[2], info.key[3]
    );
    println!(
        "[info] header CRC stored=0x{:04X} calc=0x{:04X} -> {}",
        info.header_crc.stored,
        info.header_crc.computed,
        if info.header_crc.matches() { "OK" } else { "MISMATCH" }
    );

    for (name, wallet) in [("A", &info.wallet_a), ("B", &info.wallet_b)] {
        println!(
            "[info] wallet {}: version 0x{:04X}  credit {}.{:02}  date {}",
            name,
            wallet.version,
            wallet.credit / 100,
            wallet.credit % 100,
            wallet.timestamp
        );
        println!(
            "[info] wallet {} CRC stored=0x{:04X} calc=0x{:04X} -> {}",
            name,
            wallet.crc.stored,
            wallet.crc.computed,
            if wallet.crc.matches() { "OK" } else { "MISMATCH" }
        );
    }
}
