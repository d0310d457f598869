//! Entry point for the command-line interface.

use uplift::args::{parse_cli, Commands};
use uplift::translate::run_translate;

fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    match cli.command {
        Commands::Translate(args) => run_translate(args),
    }
}
