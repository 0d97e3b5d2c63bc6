use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "taskpulse", version, about = "Taskpulse productivity analytics")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Productivity metrics
    Metrics(commands::SnapshotArgs),
    /// Behavioral insights
    Insights(commands::SnapshotArgs),
    /// Team analytics over the snapshot's members
    Team(commands::SnapshotArgs),
    /// Completion time prediction for one task
    Predict {
        #[command(flatten)]
        input: commands::SnapshotArgs,
        /// Id of the task to predict
        #[arg(long)]
        task: String,
    },
    /// Personal, team and system recommendations
    Recommend(commands::SnapshotArgs),
    /// Every analysis in one document
    Report(commands::SnapshotArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Metrics(input) => commands::analyze::metrics(&input),
        Commands::Insights(input) => commands::analyze::insights(&input),
        Commands::Team(input) => commands::analyze::team(&input),
        Commands::Predict { input, task } => commands::analyze::predict(&input, &task),
        Commands::Recommend(input) => commands::analyze::recommend(&input),
        Commands::Report(input) => commands::analyze::report(&input),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
