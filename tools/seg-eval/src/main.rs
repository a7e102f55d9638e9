//! 分割结果批量评估工具.

mod args;
mod result;
mod runner;

use args::Cli;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::io;
use std::process::ExitCode;

fn init_logger(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = SimpleLogger::new().with_level(level);
    // 未指定 `-v` 时允许 `RUST_LOG` 覆盖默认级别.
    let logger = if verbose == 0 { logger.env() } else { logger };
    logger.init()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.verbose) {
        eprintln!("Logger initialization error: {e}");
    }

    match runner::run(cli.command) {
        Ok(outcome) => {
            if let Err(e) = outcome.report(&mut io::stdout().lock()) {
                log::error!("Cannot print summary: {e}");
            }
            if outcome.has_lost() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
