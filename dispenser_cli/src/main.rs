mod cli;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD};
use eyre::WrapErr;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    init_tracing(&args)?;

    match args.cmd {
        Commands::Run {
            tick_ms,
            ref event_log,
            max_ticks,
        } => run::run(&args.schedule, tick_ms, event_log, max_ticks),
        Commands::SelfCheck => run::self_check(),
        Commands::Home => run::home(),
        Commands::Schedule => run::print_schedule(&args.schedule),
    }
}

fn init_tracing(args: &Cli) -> eyre::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let console = if args.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let file = match &args.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path.file_name().map(Path::new).unwrap_or(Path::new("dispenser.log"));
            let appender =
                tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            FILE_GUARD
                .set(guard)
                .map_err(|_| eyre::eyre!("log guard already installed"))
                .wrap_err("initializing file logging")?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}
