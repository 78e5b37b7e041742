use crate::report::{run_fetch, run_report, FetchArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use taskboard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "taskboard",
    about = "Classify and aggregate operations tasks from the shared task sheet",
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
    /// Print a dashboard for CSV exports of the task and roster sheets
    Report(ReportArgs),
    /// Fetch a task sheet from the live row source and print its dashboard
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Fetch(args) => run_fetch(args).await,
    }
}
