mod commands;
mod startup;

use chrono::Utc;
use clap::{Parser, Subcommand};
use commands::calendar::{self, AddArgs};
use commands::CommandContext;
use lukkari::components::calendar::EventPatch;
use lukkari::utils::{KeyValueStore, TomlStateStore};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "lukkari")]
#[command(about = "Course calendar: assignments, lectures and your own events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid (defaults to the last viewed month)
    Month {
        #[arg(short, long)]
        year: Option<i32>,

        #[arg(short, long)]
        month: Option<u32>,
    },
    /// List the events of one day (YYYY-MM-DD)
    Day { date: String },
    /// List the Monday to Sunday week around a day (defaults to today)
    Week { date: Option<String> },
    /// List events from today on
    Upcoming {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Add an event
    Add {
        title: String,

        /// Date or date-time (e.g. "2026-10-20" or "2026-10-20T14:00")
        #[arg(short, long)]
        date: String,

        #[arg(long)]
        description: Option<String>,

        /// Repeat daily, weekly or monthly
        #[arg(long)]
        repeat: Option<String>,

        /// First day of the repetition
        #[arg(long)]
        from: Option<String>,

        /// Repeat until this date (exclusive)
        #[arg(long)]
        until: Option<String>,
    },
    /// Change a stored event
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a stored event
    Delete { id: String },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting lukkari");

    // Load configuration
    let config = startup::load_config().await?;
    let (tz, state_file) = {
        let config_read = config.read().await;
        (config_read.timezone()?, config_read.state_file.clone())
    };

    let (calendar_handle, load_error) = startup::start_calendar(config).await?;
    if let Some(e) = load_error {
        eprintln!("Calendar data unavailable: {}", e);
    }

    let state = TomlStateStore::open(&state_file)?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let mut ctx = CommandContext::new(calendar_handle.clone(), state, today);

    let result = match cli.command.unwrap_or(Commands::Month {
        year: None,
        month: None,
    }) {
        Commands::Month { year, month } => calendar::month(&mut ctx, year, month).await,
        Commands::Day { date } => calendar::day(&mut ctx, &date).await,
        Commands::Week { date } => calendar::week(&ctx, date.as_deref()).await,
        Commands::Upcoming { limit } => calendar::upcoming(&ctx, limit).await,
        Commands::Add {
            title,
            date,
            description,
            repeat,
            from,
            until,
        } => {
            let args = AddArgs {
                title,
                date,
                description,
                repeat,
                from,
                until,
            };
            calendar::add(&ctx, args).await
        }
        Commands::Edit {
            id,
            title,
            date,
            description,
        } => {
            let patch = EventPatch {
                title,
                description,
                date,
                ..Default::default()
            };
            calendar::edit(&ctx, &id, patch).await
        }
        Commands::Delete { id } => calendar::delete(&ctx, &id).await,
    };

    if let Err(e) = ctx.state.flush() {
        error!("Failed to save view state: {}", e);
    }
    calendar_handle.shutdown().await?;

    result.map_err(Into::into)
}
