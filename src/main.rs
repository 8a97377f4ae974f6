use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use meetgrid::cli::{self, OutputFormat};
use meetgrid::DEFAULT_SERVER_URL;

#[derive(Parser)]
#[command(name = "meetgrid")]
#[command(about = "Team meeting scheduler built on weekly availability grids", version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and store its API key locally
    Register {
        /// Your email
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Team name
        #[arg(long)]
        team: Option<String>,
        /// Server URL
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// View and edit weekly availability grids
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Suggest the best meeting times on a day
    Suggest {
        /// Comma separated emails to meet with
        #[arg(long)]
        with: String,
        /// Day to meet (e.g., "2025-03-03")
        #[arg(long)]
        date: String,
        /// Duration (e.g., "30m", "1h", "1h30m")
        #[arg(long, default_value = "1h")]
        duration: String,
    },
    /// Book and manage meetings
    Meeting {
        #[command(subcommand)]
        action: MeetingAction,
    },
    /// View and manage notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(long, env = "MEETGRID_PORT", default_value = "8080")]
        port: u16,
        /// Database file path
        #[arg(long, env = "MEETGRID_DB", default_value = "./meetgrid.db")]
        db: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set server URL
    Server {
        /// Server URL
        url: String,
    },
    /// Replace your API key with a fresh one
    RotateKey,
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Show a weekly grid (yours by default)
    Show {
        /// Whose grid to show
        #[arg(long)]
        email: Option<String>,
    },
    /// Replace your grid with a JSON file
    Set {
        /// Path to the grid JSON
        file: String,
    },
    /// Set one slot of your grid
    Slot {
        /// Day of the week (e.g., "monday")
        day: String,
        /// Hour slot (e.g., "9:00")
        slot: String,
        /// available, if-needed or unavailable
        state: String,
    },
}

#[derive(Subcommand)]
enum MeetingAction {
    /// Book a meeting
    Create {
        /// Meeting title
        #[arg(long)]
        title: String,
        /// Start time in UTC (e.g., "2025-03-03T10:00")
        #[arg(long)]
        start: String,
        /// Duration (e.g., "30m", "1h")
        #[arg(long, default_value = "1h")]
        duration: String,
        /// Comma separated emails to invite
        #[arg(long)]
        with: String,
        /// Meeting description
        #[arg(long)]
        description: Option<String>,
    },
    /// List your meetings
    List,
    /// Show one meeting
    Show {
        /// Meeting ID
        id: String,
    },
    /// Accept or reject an invitation
    Respond {
        /// Meeting ID
        id: String,
        /// accept or reject
        response: String,
    },
    /// Cancel a meeting you organize
    Cancel {
        /// Meeting ID
        id: String,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List notifications
    List {
        /// Only unread ones
        #[arg(long)]
        unread: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Delete all notifications
    Clear,
    /// Print new notifications as they arrive
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("{}=info", meetgrid::APP_NAME).parse()?),
        )
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Register {
            email,
            name,
            team,
            server,
        } => {
            cli::run_register(&server, &email, &name, team.as_deref(), format).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                cli::run_config_show(format).await?;
            }
            ConfigAction::Server { url } => {
                cli::run_config_server(&url, format)?;
            }
            ConfigAction::RotateKey => {
                cli::run_config_rotate_key(format).await?;
            }
        },
        Commands::Schedule { action } => match action {
            ScheduleAction::Show { email } => {
                cli::run_schedule_show(email.as_deref(), format).await?;
            }
            ScheduleAction::Set { file } => {
                cli::run_schedule_set(&file, format).await?;
            }
            ScheduleAction::Slot { day, slot, state } => {
                cli::run_schedule_slot(&day, &slot, &state, format).await?;
            }
        },
        Commands::Suggest {
            with,
            date,
            duration,
        } => {
            cli::run_suggest(&with, &date, &duration, format).await?;
        }
        Commands::Meeting { action } => match action {
            MeetingAction::Create {
                title,
                start,
                duration,
                with,
                description,
            } => {
                cli::run_meeting_create(
                    &title,
                    &start,
                    &duration,
                    &with,
                    description.as_deref(),
                    format,
                )
                .await?;
            }
            MeetingAction::List => {
                cli::run_meeting_list(format).await?;
            }
            MeetingAction::Show { id } => {
                cli::run_meeting_show(&id, format).await?;
            }
            MeetingAction::Respond { id, response } => {
                cli::run_meeting_respond(&id, &response, format).await?;
            }
            MeetingAction::Cancel { id } => {
                cli::run_meeting_cancel(&id, format).await?;
            }
        },
        Commands::Notifications { action } => match action {
            NotificationAction::List { unread } => {
                cli::run_notifications_list(unread, format).await?;
            }
            NotificationAction::Read { id } => {
                cli::run_notifications_read(&id, format).await?;
            }
            NotificationAction::ReadAll => {
                cli::run_notifications_read_all(format).await?;
            }
            NotificationAction::Clear => {
                cli::run_notifications_clear(format).await?;
            }
            NotificationAction::Watch => {
                cli::run_notifications_watch(format).await?;
            }
        },
        Commands::Serve { port, db } => {
            let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
            meetgrid::server::run_server(addr, &db).await?;
        }
    }

    Ok(())
}
