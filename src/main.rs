use clap::{Parser, Subcommand};
use leaveflow::application::engine::LeaveEngine;
use leaveflow::config::{WorkflowConfig, load_config};
use leaveflow::domain::approval::RoleKey;
use leaveflow::domain::ports::{LeaveStoreBox, UserDirectoryBox};
use leaveflow::domain::user::{NewUser, Position, Role};
use leaveflow::infrastructure::in_memory::{InMemoryLeaveStore, InMemoryUserDirectory};
use leaveflow::interfaces::csv::action_reader::ActionReader;
use leaveflow::interfaces::csv::request_writer::RequestWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// TOML configuration file (optional). Defaults to the stock organization.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply an action script (CSV) and print every stored request
    Process {
        /// Input actions CSV file
        input: PathBuf,
    },
    /// Print stored requests, optionally filtered
    Report {
        /// Case-insensitive substring of requester or department
        #[arg(long)]
        search: Option<String>,
        /// Only this user's own requests, followed by their totals
        #[arg(long, conflicts_with_all = ["search", "queue"])]
        requester: Option<String>,
        /// Approval queue of the `--as` user for a role (mentor, supervisor, hr)
        #[arg(long, conflicts_with = "search")]
        queue: Option<RoleKey>,
        /// User the listing is made as
        #[arg(long = "as", default_value = "admin")]
        actor: String,
    },
    /// Print HR statistics
    Stats {
        #[arg(long = "as", default_value = "admin")]
        actor: String,
    },
    /// Check credentials, print the landing dashboard and the user's inbox
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Add a user to the directory
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Repeat for several roles
        #[arg(long = "role", required = true)]
        roles: Vec<Role>,
        #[arg(long)]
        position: Position,
        #[arg(long)]
        department: String,
        #[arg(long)]
        mentor: Option<String>,
        #[arg(long)]
        supervisor: Option<String>,
    },
    /// Print a request's attachment as a data URL
    Attachment {
        id: u64,
        #[arg(long = "as", default_value = "admin")]
        actor: String,
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },
}

fn build_engine(db_path: Option<&Path>, workflow: WorkflowConfig) -> Result<LeaveEngine> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(path) = db_path {
        let store = leaveflow::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
        let directory: UserDirectoryBox = Box::new(store.clone());
        let leaves: LeaveStoreBox = Box::new(store);
        return Ok(LeaveEngine::new(directory, leaves, workflow));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        tracing::warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    let directory: UserDirectoryBox = Box::new(InMemoryUserDirectory::new());
    let leaves: LeaveStoreBox = Box::new(InMemoryLeaveStore::new());
    Ok(LeaveEngine::new(directory, leaves, workflow))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).into_diagnostic()?;
    let attachment_limit = config.workflow.max_attachment_bytes;
    let engine = build_engine(cli.db_path.as_deref(), config.workflow)?;

    let seeded = engine.seed_users(config.users).await.into_diagnostic()?;
    let unsupervised = engine.check_approvers().await.into_diagnostic()?;
    debug!(seeded, unsupervised = unsupervised.len(), "user directory ready");

    let stdout = io::stdout();
    let mut writer = RequestWriter::new(stdout.lock());

    match cli.command {
        Command::Process { input } => {
            let file = File::open(input).into_diagnostic()?;
            let reader = ActionReader::new(file);
            for action_result in reader.actions() {
                match action_result {
                    Ok(action) => {
                        if let Err(e) = action.execute(&engine, attachment_limit).await {
                            error!("Error processing action: {}", e);
                        }
                    }
                    Err(e) => {
                        error!("Error reading action: {}", e);
                    }
                }
            }

            let requests = engine.all_requests().await.into_diagnostic()?;
            writer.write_requests(&requests).into_diagnostic()?;
        }
        Command::Report {
            search,
            requester,
            queue,
            actor,
        } => match (requester, queue) {
            (Some(requester), _) => {
                let session = engine.session_for(&requester).await.into_diagnostic()?;
                let mine = engine.list_mine(&session).await.into_diagnostic()?;
                let summary = engine.my_summary(&session).await.into_diagnostic()?;
                writer.write_requests(&mine).into_diagnostic()?;
                writer.write_summary(&summary).into_diagnostic()?;
            }
            (None, Some(key)) => {
                let session = engine.session_for(&actor).await.into_diagnostic()?;
                let listed = engine.list_for_approver(&session, key).await.into_diagnostic()?;
                let pending = engine.pending_count(&session, key).await.into_diagnostic()?;
                writer.write_requests(&listed).into_diagnostic()?;
                writer.write_metric("pending", pending).into_diagnostic()?;
            }
            (None, None) => {
                let session = engine.session_for(&actor).await.into_diagnostic()?;
                let keyword = search.unwrap_or_default();
                let found = engine.search(&session, &keyword).await.into_diagnostic()?;
                writer.write_requests(&found).into_diagnostic()?;
            }
        },
        Command::Stats { actor } => {
            let session = engine.session_for(&actor).await.into_diagnostic()?;
            let stats = engine.stats(&session).await.into_diagnostic()?;
            writer.write_stats(&stats).into_diagnostic()?;
        }
        Command::Login { username, password } => {
            let session = engine.login(&username, &password).await.into_diagnostic()?;
            writer
                .write_metric("dashboard", session.landing())
                .into_diagnostic()?;
            let inbox = engine.inbox(&session).await.into_diagnostic()?;
            writer.write_requests(&inbox).into_diagnostic()?;
        }
        Command::Register {
            username,
            password,
            roles,
            position,
            department,
            mentor,
            supervisor,
        } => {
            let user = engine
                .register(NewUser {
                    username,
                    password,
                    roles,
                    position: Some(position),
                    department,
                    mentor,
                    supervisor,
                })
                .await
                .into_diagnostic()?;
            writer
                .write_metric("registered", &user.username)
                .into_diagnostic()?;
        }
        Command::Attachment { id, actor, mime } => {
            let session = engine.session_for(&actor).await.into_diagnostic()?;
            let attachment = engine.attachment(&session, id).await.into_diagnostic()?;
            println!("{}", attachment.data_url(&mime));
        }
    }

    Ok(())
}
