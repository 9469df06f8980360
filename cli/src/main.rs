use anyhow::Result;
use clap::Parser;
use search_cli::{run, Options};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let opts = Options::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&opts, &mut out)
}
