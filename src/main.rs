//! Agentic CLI binary entry point.

use clap::Parser;
use agentic::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    agentic::cli::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Turn(args) => agentic::cli::handle_turn(args).await,
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
