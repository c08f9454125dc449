mod app;
mod cli;
mod tone;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::App;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = cli::Args::parse();
    let app = App::new(args)?;
    app.run()?;

    Ok(())
}
