use crate::demo::{run_catalog_report, run_demo, CatalogArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use gyohwan::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gyohwan",
    about = "Run and inspect the exchange application service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the partner-university catalog from a CSV file
    Catalog(CatalogArgs),
    /// Walk through sign-in, application updates, and rankings in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// University catalog CSV loaded at startup
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Student roster CSV loaded at startup
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog(args) => run_catalog_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
