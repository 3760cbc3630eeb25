use std::process::ExitCode;

use clap::Parser;
use console::style;
use stylezx_cli::{init_logging, run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match run(&cli, &mut stdout) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}: {:#}", style("error").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
