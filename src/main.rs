//! galley CLI — versioned, composable recipes.

use clap::Parser;

fn main() {
    let cli = galley::cli::Cli::parse();
    if let Err(e) = galley::cli::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
