mod cli;
mod logging;
mod terminal;

use anyhow::Context;
use clap::Parser;
use grab_logging::{grab_error, grab_info, grab_warn};
use threadgrab_core::load_seed_file;
use threadgrab_engine::Engine;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());
    terminal::print_banner();

    let result = run(&cli);
    if let Err(err) = &result {
        grab_error!("{:#}", err);
    }
    terminal::pause_before_exit(cli.no_pause);
    result
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let seeds = match load_seed_file(&cli.config) {
        Ok(seeds) => seeds,
        Err(err) if err.is_not_configured() => {
            println!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for line in &seeds.rejected {
        grab_warn!("{} is not valid URL!", line);
    }
    if seeds.is_empty() {
        println!("{} has no valid URLs", cli.config.display());
        return Ok(());
    }
    grab_info!("Loaded {} thread URLs from {:?}", seeds.seeds.len(), cli.config);

    let engine = Engine::new(cli.settings()).context("failed to build http client")?;
    let summary = engine
        .run_blocking(seeds.seeds)
        .context("failed to start async runtime")?;

    terminal::print_summary(&summary);
    Ok(())
}
