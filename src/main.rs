mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steward::app::Steward;
use steward::config::{default_config_path, StewardConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "steward", version, about = "Personal-assistant automation: memory, tasks, schedules, multi-platform AI")]
struct Cli {
    /// Config file (defaults to ~/.steward/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler with all default jobs until Ctrl-C
    Start,
    /// Show store health, assistant state, platforms and schedule
    Status,
    /// Set the API key for a platform (perplexity, abacus, deepagent)
    Configure { platform: String, credential: String },
    /// Generate and save a daily report now
    Update,
    /// Send a prompt to one or more platforms and merge the replies
    Ask {
        prompt: String,
        /// Platform to query; repeat for several. Defaults to the configured list.
        #[arg(long = "platform", short)]
        platforms: Vec<String>,
        /// Print per-platform results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Read and write memory entries
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Export project context to a handoff JSON file
    Handoff {
        /// Project JSON file with name, description, code, requirements
        project: PathBuf,
        instructions: String,
    },
    /// Save an assistant space configuration
    Space {
        name: String,
        personality: String,
        purpose: String,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// List pending tasks, most urgent first
    List,
    /// Create a pending task
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
        #[arg(long, short, default_value_t = 5)]
        priority: i64,
        /// Due this many hours from now
        #[arg(long)]
        due_hours: Option<i64>,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show one entry
    Get { key: String },
    /// Write an entry; JSON values are stored as structured data
    Set {
        key: String,
        value: String,
        #[arg(long, short, default_value = "user_input")]
        category: String,
    },
    /// Show the most recently written entries
    List {
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = StewardConfig::load_from(&config_path)?;

    // Log to stderr so command output on stdout stays clean.
    let filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !config_path.exists() {
        tracing::info!(path = %config_path.display(), "no config file, using defaults");
    }

    let app = Steward::open(config)?;

    match cli.command {
        Command::Start => cli::start(&app).await?,
        Command::Status => cli::status(&app)?,
        Command::Configure {
            platform,
            credential,
        } => cli::configure(&app, &platform, &credential)?,
        Command::Update => cli::update(&app)?,
        Command::Ask {
            prompt,
            platforms,
            json,
        } => cli::ask(&app, &prompt, &platforms, json).await?,
        Command::Task { action } => match action {
            TaskAction::List => cli::task::list(&app)?,
            TaskAction::Add {
                title,
                description,
                priority,
                due_hours,
            } => cli::task::add(&app, &title, &description, priority, due_hours)?,
        },
        Command::Memory { action } => match action {
            MemoryAction::Get { key } => cli::memory::get(&app, &key)?,
            MemoryAction::Set {
                key,
                value,
                category,
            } => cli::memory::set(&app, &key, &value, &category)?,
            MemoryAction::List { limit } => cli::memory::list(&app, limit)?,
        },
        Command::Handoff {
            project,
            instructions,
        } => cli::handoff(&app, &project, &instructions).await?,
        Command::Space {
            name,
            personality,
            purpose,
        } => cli::space(&app, &name, &personality, &purpose)?,
    }

    Ok(())
}
