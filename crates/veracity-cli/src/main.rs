//! Veracity CLI - Research replay and verdict calibration from the command line.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use veracity_cli::{commands, Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean on stdout
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(Some(config_path.as_path()))
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let output = match cli.command {
        Command::Run(args) => {
            let fixture = args.fixture.display().to_string();
            commands::execute_run(args, &config, &formatter)
                .await
                .with_context(|| format!("run failed for {}", fixture))?
        }
        Command::Rate(args) => commands::execute_rate(args, &config, &formatter)?,
        Command::Config(args) => commands::execute_config(args, &config, &config_path, &formatter)?,
    };

    println!("{}", output);
    Ok(())
}
