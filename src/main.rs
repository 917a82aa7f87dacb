use clap::Parser;
use event_replay::cli::commands::{cmd_replay, cmd_task_list, cmd_task_replay};
use event_replay::cli::config::{
    Cli, Commands, TaskCommand, load_config, resolve_enrichment, resolve_webdriver,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve settings: CLI > config > env > defaults
    let webdriver = resolve_webdriver(&cli, &config.webdriver);
    let enrichment = resolve_enrichment(&cli, &config.enrichment);

    let completed = match &cli.command {
        Commands::Replay {
            events,
            data,
            keep_open,
        } => cmd_replay(
            events,
            data.as_deref(),
            *keep_open,
            &webdriver,
            &config.replay,
            &enrichment,
        )?,
        Commands::Task { command } => match command {
            TaskCommand::List => {
                cmd_task_list(&config.tasks.base_url)?;
                true
            }
            TaskCommand::Replay {
                id,
                data,
                keep_open,
            } => cmd_task_replay(
                &config.tasks.base_url,
                id,
                data.as_deref(),
                *keep_open,
                &webdriver,
                &config.replay,
                &enrichment,
            )?,
        },
    };

    if !completed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
