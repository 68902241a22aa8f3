//! hydra CLI entry point.
//!
//! Parses command-line arguments and dispatches to the appropriate command handler.

use clap::{Parser, Subcommand};
use hydra::commands::{config_display_command, config_init_command, gui_command};
use hydra::output::print_error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hydra")]
#[command(
    version,
    about = "Multi-app navigation and session host for egui",
    after_help = "EXAMPLES:
    # Open the host window with the demo apps
    hydra
    hydra gui --config ./hydra.toml

    # Inspect or create the configuration
    hydra config
    hydra config --init
    hydra config --path ./hydra.toml

LOGGING:
    RUST_LOG overrides the default filter, e.g. RUST_LOG=hydra=trace"
)]
struct Cli {
    /// Log host decisions (transitions, gate, clearing) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the host window with the bundled demo apps
    Gui {
        /// Config file to use instead of ~/.config/hydra/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the effective configuration
    #[command(after_help = "EXAMPLES:
    hydra config                    # Global config (or defaults)
    hydra config --path hydra.toml  # Validate and show a specific file
    hydra config --init             # Write ~/.config/hydra/config.toml")]
    Config {
        /// Write the commented default config if none exists
        #[arg(long, conflicts_with = "path")]
        init: bool,

        /// Show and validate this file instead of the global config
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    hydra::logging::init(cli.verbose);

    let result = match &cli.command {
        None => gui_command(None),
        Some(Commands::Gui { config }) => gui_command(config.as_deref()),
        Some(Commands::Config { init: true, .. }) => config_init_command(),
        Some(Commands::Config { path, .. }) => config_display_command(path.as_deref()),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
