use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;

use ticketdesk::api::HttpClient;
use ticketdesk::commands;
use ticketdesk::config::Config;
use ticketdesk::db::Database;
use ticketdesk::filter::TicketFilter;
use ticketdesk::session::SessionStore;

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "A lean command-line client for a support-ticketing backend")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Account email
        email: String,
        /// Account password
        #[arg(short, long, env = "TICKETDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a new account
    Signup {
        /// Display name
        name: String,
        /// Account email
        email: String,
        /// Account password
        #[arg(short, long, env = "TICKETDESK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role (user, admin)
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List tickets for the logged-in role
    List {
        /// Filter by status (open, pending, in_progress, resolved, withdrawn, all)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by urgency (low, medium, high, critical, all)
        #[arg(short, long)]
        urgency: Option<String>,
        /// Case-insensitive search in ticket ID, subject and description
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Filter by creation year (YYYY)
        #[arg(long)]
        year: Option<String>,
        /// Filter by creation month (1-12)
        #[arg(long)]
        month: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show ticket details
    Show {
        /// Ticket ID
        id: String,
    },

    /// Submit a new ticket
    Submit {
        /// Ticket subject
        subject: String,
        /// Ticket description
        #[arg(short, long)]
        description: Option<String>,
        /// Urgency (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        urgency: String,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Triage a ticket (admin)
    Update {
        /// Ticket ID
        id: String,
        /// New priority (low, medium, high, critical)
        #[arg(short, long)]
        priority: Option<String>,
        /// New urgency
        #[arg(short, long)]
        urgency: Option<String>,
        /// New status (open, pending, in_progress, resolved)
        #[arg(short, long)]
        status: Option<String>,
        /// Suggestion shown to the ticket owner
        #[arg(long)]
        suggestion: Option<String>,
    },

    /// Edit one of your tickets locally
    Edit {
        /// Ticket ID
        id: String,
        /// New subject
        #[arg(short, long)]
        subject: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New urgency
        #[arg(short, long)]
        urgency: Option<String>,
    },

    /// Withdraw one of your open tickets
    Withdraw {
        /// Ticket ID
        id: String,
    },

    /// Hide one of your tickets
    Delete {
        /// Ticket ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// List local edits waiting to sync
    Pending,

    /// Drop a pending local edit
    Discard {
        /// Ticket ID
        id: String,
    },

    /// Show the effective configuration
    Config,
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TICKETDESK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn get_db(config: &Config) -> Result<Database> {
    let dir = config.data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Database::open(&config.db_path()?).context("Failed to open database")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = Config::load_dotenv();
    init_tracing(cli.verbose, cli.log_json)?;
    if let Some(path) = &dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let config = Config::load()?;
    if let Commands::Config = cli.command {
        return commands::config::run(&config);
    }

    let db = get_db(&config)?;
    let backend = HttpClient::new(&config.api_url)?;
    tracing::debug!(api_url = backend.base_url(), "using backend");
    let mut store = SessionStore::restore(&db);

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&mut store, &backend, &email, &password)
        }

        Commands::Signup {
            name,
            email,
            password,
            role,
        } => commands::auth::signup(&store, &backend, &name, &email, &password, &role),

        Commands::Logout => {
            commands::auth::logout(&mut store);
            Ok(())
        }

        Commands::Whoami => {
            commands::auth::whoami(&store);
            Ok(())
        }

        Commands::List {
            status,
            urgency,
            search,
            year,
            month,
            json,
        } => {
            let filter = TicketFilter::new()
                .with_status(status.as_deref())
                .with_urgency(urgency.as_deref())
                .with_search(search.as_deref())
                .with_year(year.as_deref())
                .with_month(month.as_deref());
            commands::list::run(&db, &store, &backend, &filter, json)
        }

        Commands::Show { id } => commands::show::run(&db, &store, &backend, &id),

        Commands::Submit {
            subject,
            description,
            urgency,
            category,
        } => commands::submit::run(
            &store,
            &backend,
            &subject,
            description.as_deref(),
            &urgency,
            category.as_deref(),
        ),

        Commands::Update {
            id,
            priority,
            urgency,
            status,
            suggestion,
        } => commands::update::run(
            &store,
            &backend,
            &id,
            priority.as_deref(),
            urgency.as_deref(),
            status.as_deref(),
            suggestion.as_deref(),
        ),

        Commands::Edit {
            id,
            subject,
            description,
            urgency,
        } => commands::edit::edit(
            &db,
            &store,
            &backend,
            &id,
            subject.as_deref(),
            description.as_deref(),
            urgency.as_deref(),
        ),

        Commands::Withdraw { id } => commands::edit::withdraw(&db, &store, &backend, &id),

        Commands::Delete { id, force } => commands::edit::delete(&db, &store, &backend, &id, force),

        Commands::Pending => commands::edit::pending(&db, &store),

        Commands::Discard { id } => commands::edit::discard(&db, &store, &id),

        Commands::Config => commands::config::run(&config),
    }
}
