mod bindings;
mod cli;
mod paths;
mod platform;
mod run;
mod state;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Params(args)) => run::print_params(args),
        None => run::run(cli.run),
    }
}
