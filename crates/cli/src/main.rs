// scriptpad CLI entry point.

use clap::Parser;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "scriptpad", about = "Create, inspect and configure scriptpad scripts")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli.command)
}
