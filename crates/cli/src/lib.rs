pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use product_audit_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "product-audit",
    about = "Product audit operator CLI",
    long_about = "Score products on profitability, supplier, feed and market health, run batch audits, and inspect configuration.",
    after_help = "Examples:\n  product-audit audit --input product.json\n  product-audit batch --input catalogue.json\n  product-audit doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a product-audit.toml config file (must exist)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Audit one product from a JSON input file")]
    Audit {
        #[arg(long, help = "JSON file holding the product's audit input bundles")]
        input: PathBuf,
        #[arg(long, help = "Emit the full audit result as JSON")]
        json: bool,
    },
    #[command(about = "Audit a JSON array of products concurrently and emit a batch report")]
    Batch {
        #[arg(long, help = "JSON file holding an array of product audit requests")]
        input: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config and run engine and batch self-tests")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            ..LoadOptions::default()
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();
    logging::init_logging(&options);

    let result = match cli.command {
        Command::Audit { input, json } => commands::audit::run(&input, json, options),
        Command::Batch { input } => commands::batch::run(&input, options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json, options) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
