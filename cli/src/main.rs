//! unrtf CLI - Convert RTF documents to HTML
//!
//! A command-line tool for converting Rich Text Format documents into
//! HTML with extracted embedded files.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use unrtf::Unrtf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "unrtf")]
#[command(version = VERSION)]
#[command(about = "Convert RTF documents to HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input RTF file (for direct conversion without subcommand)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory (default: <input>_output)
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// URL prefix for extracted file references in the HTML
    #[arg(long, default_value = "files/")]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an RTF file to HTML
    Convert {
        /// Input RTF file
        input: PathBuf,

        /// Output directory (default: <input>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// URL prefix for extracted file references in the HTML
        #[arg(long, default_value = "files/")]
        base_url: String,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            base_url,
        }) => {
            convert_document(&input, output, &base_url);
        }
        Some(Commands::Version) => {
            print_version();
        }
        None => {
            if let Some(input) = cli.input {
                convert_document(&input, cli.output_dir, &cli.base_url);
            } else {
                eprintln!("{}", "Usage: unrtf <INPUT> [OUTPUT_DIR] [OPTIONS]".yellow());
                eprintln!();
                eprintln!("Try 'unrtf --help' for more information.");
                std::process::exit(1);
            }
        }
    }
}

fn print_version() {
    println!("{} {}", "unrtf".green().bold(), VERSION);
    println!("An RTF to HTML converter");
}

fn convert_document(input: &PathBuf, output: Option<PathBuf>, base_url: &str) {
    if !input.exists() {
        eprintln!(
            "{} Input file not found: {}",
            "Error:".red().bold(),
            input.display()
        );
        std::process::exit(1);
    }

    // Determine output directory
    let output_dir = output.unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input
            .parent()
            .unwrap_or(std::path::Path::new("."))
            .join(format!("{}_output", stem))
    });

    if let Err(e) = fs::create_dir_all(&output_dir) {
        eprintln!(
            "{} Failed to create output directory: {}",
            "Error:".red().bold(),
            e
        );
        std::process::exit(1);
    }

    println!("{} {}", "Parsing:".cyan().bold(), input.display());

    let parsed = match Unrtf::new().with_base_url(base_url).parse(input) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{} Failed to parse document: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    // Extract embedded files
    let files_dir = output_dir.join("files");
    let file_count = match parsed.write_files(&files_dir) {
        Ok(count) => count,
        Err(e) => {
            eprintln!(
                "{} Failed to write extracted files: {}",
                "Warning:".yellow().bold(),
                e
            );
            0
        }
    };

    let html = parsed.to_html();
    let plain_text = parsed.to_text();
    let document = parsed.into_document();
    let content_json = document.raw_content();

    // Write document.html
    let html_path = output_dir.join("document.html");
    if let Err(e) = fs::write(&html_path, &html) {
        eprintln!(
            "{} Failed to write document.html: {}",
            "Error:".red().bold(),
            e
        );
        std::process::exit(1);
    }

    // Write document.txt
    let txt_path = output_dir.join("document.txt");
    if let Err(e) = fs::write(&txt_path, &plain_text) {
        eprintln!(
            "{} Failed to write document.txt: {}",
            "Error:".red().bold(),
            e
        );
        std::process::exit(1);
    }

    // Write content.json
    let json_path = output_dir.join("content.json");
    if let Err(e) = fs::write(&json_path, &content_json) {
        eprintln!(
            "{} Failed to write content.json: {}",
            "Warning:".yellow().bold(),
            e
        );
    }

    println!();
    println!("{} {}", "Output:".green().bold(), output_dir.display());
    println!("  {} document.html ({} bytes)", "→".cyan(), html.len());
    println!("  {} document.txt ({} bytes)", "→".cyan(), plain_text.len());
    println!(
        "  {} content.json ({} bytes)",
        "→".cyan(),
        content_json.len()
    );
    println!("  {} files/ ({} files)", "→".cyan(), file_count);
    println!("{}", "Done!".green().bold());
}
