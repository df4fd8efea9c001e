use crate::demo::{run_demo, run_route, DemoArgs, RouteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use kvb_pass::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "KVB-PASS",
    about = "Run and demonstrate the KVB-PASS student leave service from the command line",
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
    /// Show which staff role would receive an application submitted at a given time
    Route(RouteArgs),
    /// Run a scripted week of submissions, decisions and gate movements
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
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Route(args) => run_route(args),
        Command::Demo(args) => run_demo(args),
    }
}
