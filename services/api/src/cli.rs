use crate::demo::{run_demo, run_feed, DemoArgs, FeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use donate_swipe::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "DonateSwipe Engagement",
    about = "Run or demonstrate the DonateSwipe engagement service from the command line",
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
    /// Print the ranked swipe feed for one user
    Feed(FeedArgs),
    /// Walk through swiping, ranking, and points for a demo donor
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
    /// Seed the catalog from a CSV export instead of the built-in requests
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Feed(args) => run_feed(args),
        Command::Demo(args) => run_demo(args),
    }
}
