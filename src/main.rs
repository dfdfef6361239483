use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod theme;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    command: InkpressCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "inkpress.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "inkpress.yaml")]
    config_file: Option<PathBuf>,

    /// Only print what would be deleted
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum InkpressCommand {
    /// Build the site
    Build(BuildArgs),

    /// Delete the generated site
    Clean(CleanArgs),
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        InkpressCommand::Build(args) => {
            commands::build::run(&args)?;
        }
        InkpressCommand::Clean(args) => {
            commands::clean::run(&args)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "inkpress=info",
        1 => "inkpress=debug",
        _ => "inkpress=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
