//! Thin CLI over [`romident::identify`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;

use romident::{IdentifyOptions, IdentifyResult, identify};

#[derive(Parser)]
#[command(name = "romident", version, about = "Identify console ROMs and disc images")]
struct Cli {
    /// File, ZIP archive, or directory to identify.
    path: PathBuf,

    /// Emit JSON instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Largest file to hash, in bytes (-1 for no limit).
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    max_hash_size: i64,

    /// Treat ZIP archives as opaque files instead of looking inside.
    #[arg(long)]
    no_archives: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let options = IdentifyOptions::new()
        .max_hash_size(cli.max_hash_size)
        .decompress_archives(!cli.no_archives);

    match identify(&cli.path, &options) {
        Ok(result) => {
            if cli.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("{}: {e}", "error".red().bold());
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_human(&result);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn print_human(result: &IdentifyResult) {
    println!("{}", result.path.bold());
    for item in &result.items {
        println!("  {} ({} bytes)", item.name.bold(), item.size);
        match &item.game_info {
            Some(info) => {
                if let Some(platform) = info.platform() {
                    println!("    platform: {}", platform.display_name().green());
                }
                if let Some(title) = info.title() {
                    println!("    title:    {title}");
                }
                if let Some(serial) = info.serial() {
                    println!("    serial:   {}", serial.yellow());
                }
                let regions = info.regions();
                if !regions.is_empty() {
                    let names: Vec<&str> = regions.iter().map(|r| r.code()).collect();
                    println!("    regions:  {}", names.join(", "));
                }
            }
            None => println!("    {}", "unrecognized".dimmed()),
        }
        for (kind, value) in item.hashes.iter() {
            println!("    {:22} {}", kind.to_string().dimmed(), value.dimmed());
        }
    }
}
