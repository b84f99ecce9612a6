//! Command-line surface for the conflict desk.
//!
//! # Responsibility
//! - Map each core service operation to a subcommand.
//! - Print results as JSON on stdout and a single error line on stderr.
//!
//! Configuration comes from `CONFLICTDESK_*` variables; flags override them.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use conflictdesk_core::model::site::{Area, Site};
use conflictdesk_core::{
    init_logging, open_db, AccessService, AppConfig, AppRole, ClientRegistration,
    DirectoryService, IntakeService, NewConsultation, NotificationService, ResponseDraft,
    ResponseOutcome, ReviewService, Session, SqliteStore,
};
use log::info;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "conflictdesk", version, about = "Conflict-of-interest intake and review")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Acting user id.
    #[arg(long = "as", global = true, env = "CONFLICTDESK_USER")]
    as_user: Option<Uuid>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Directory for rotating log files; stderr when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the first central administrator on an empty database.
    Init {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Show the acting user's role and available features.
    Dashboard,
    #[command(subcommand)]
    Site(SiteCommand),
    #[command(subcommand)]
    Area(AreaCommand),
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Client(ClientCommand),
    /// Submit a conflict check for a prospective client.
    Consult {
        #[arg(long)]
        client: String,
        #[arg(long)]
        tax_id: String,
        #[arg(long)]
        service: Option<String>,
    },
    /// List the acting user's consultations, newest first.
    History,
    /// List open consultations the acting administrator may answer.
    Queue,
    /// Record a response to a consultation.
    Respond {
        consultation: Uuid,
        #[arg(long, value_enum)]
        outcome: OutcomeArg,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List responses recorded for a consultation.
    Responses { consultation: Uuid },
    /// List the acting user's notifications.
    Inbox {
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification as read.
    Read { notification: Uuid },
}

#[derive(Debug, Subcommand)]
enum SiteCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        address: Option<String>,
    },
    List,
}

#[derive(Debug, Subcommand)]
enum AreaCommand {
    Add {
        #[arg(long)]
        site: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        manager: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    List {
        #[arg(long)]
        site: Uuid,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
        #[arg(long)]
        site: Option<Uuid>,
    },
    List {
        #[arg(long)]
        site: Option<Uuid>,
    },
}

#[derive(Debug, Subcommand)]
enum ClientCommand {
    Add {
        #[arg(long)]
        site: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        tax_id: String,
        #[arg(long)]
        area: Option<Uuid>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    List {
        #[arg(long)]
        site: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    CentralAdmin,
    SiteAdmin,
    User,
}

impl From<RoleArg> for AppRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::CentralAdmin => AppRole::CentralAdmin,
            RoleArg::SiteAdmin => AppRole::SiteAdmin,
            RoleArg::User => AppRole::StandardUser,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutcomeArg {
    NoConflict,
    Conflict,
    Escalate,
}

impl From<OutcomeArg> for ResponseOutcome {
    fn from(value: OutcomeArg) -> Self {
        match value {
            OutcomeArg::NoConflict => ResponseOutcome::NoConflict,
            OutcomeArg::Conflict => ResponseOutcome::Conflict,
            OutcomeArg::Escalate => ResponseOutcome::RequiresEscalation,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    init_logging(&config.log_level, &config.log_target()).context("failed to start logging")?;
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let store = SqliteStore::new(&conn);
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Command::Init { name, email } => {
            let admin = DirectoryService::new(store).bootstrap_central_admin(&name, &email)?;
            print_json(&admin)
        }
        Command::Dashboard => {
            let session = session(cli.as_user)?;
            print_json(&AccessService::new(store).dashboard(&session)?)
        }
        Command::Site(command) => {
            let session = session(cli.as_user)?;
            let directory = DirectoryService::new(store);
            match command {
                SiteCommand::Add {
                    name,
                    email,
                    address,
                } => print_json(&directory.create_site(&session, &Site::new(name, email, address))?),
                SiteCommand::List => print_json(&directory.list_sites(&session)?),
            }
        }
        Command::Area(command) => {
            let session = session(cli.as_user)?;
            let directory = DirectoryService::new(store);
            match command {
                AreaCommand::Add {
                    site,
                    name,
                    manager,
                    email,
                } => print_json(
                    &directory.create_area(&session, &Area::new(site, name, manager, email))?,
                ),
                AreaCommand::List { site } => print_json(&directory.list_areas(&session, site)?),
            }
        }
        Command::User(command) => {
            let session = session(cli.as_user)?;
            let directory = DirectoryService::new(store);
            match command {
                UserCommand::Add {
                    name,
                    email,
                    role,
                    site,
                } => print_json(&directory.register_user(
                    &session,
                    &name,
                    &email,
                    role.into(),
                    site,
                )?),
                UserCommand::List { site } => print_json(&directory.list_users(&session, site)?),
            }
        }
        Command::Client(command) => {
            let session = session(cli.as_user)?;
            let directory = DirectoryService::new(store);
            match command {
                ClientCommand::Add {
                    site,
                    name,
                    tax_id,
                    area,
                    service,
                    status,
                } => {
                    let registration = ClientRegistration {
                        site_id: site,
                        area_id: area,
                        name,
                        tax_id,
                        service_kind: service,
                        status,
                    };
                    print_json(&directory.register_client(&session, &registration)?)
                }
                ClientCommand::List { site } => {
                    print_json(&directory.list_clients(&session, site)?)
                }
            }
        }
        Command::Consult {
            client,
            tax_id,
            service,
        } => {
            let session = session(cli.as_user)?;
            let mut input = NewConsultation::new(client, tax_id);
            input.service_kind = service;
            print_json(&IntakeService::new(store).submit_consultation(&session, &input)?)
        }
        Command::History => {
            let session = session(cli.as_user)?;
            print_json(&IntakeService::new(store).my_consultations(&session)?)
        }
        Command::Queue => {
            let session = session(cli.as_user)?;
            print_json(&ReviewService::new(store).review_queue(&session)?)
        }
        Command::Respond {
            consultation,
            outcome,
            comment,
        } => {
            let session = session(cli.as_user)?;
            let draft = ResponseDraft {
                outcome: outcome.into(),
                comment,
            };
            print_json(&ReviewService::new(store).respond(&session, consultation, &draft)?)
        }
        Command::Responses { consultation } => {
            let session = session(cli.as_user)?;
            print_json(&ReviewService::new(store).responses(&session, consultation)?)
        }
        Command::Inbox { unread } => {
            let session = session(cli.as_user)?;
            print_json(&NotificationService::new(store).inbox(&session, unread)?)
        }
        Command::Read { notification } => {
            let session = session(cli.as_user)?;
            NotificationService::new(store).mark_read(&session, notification)?;
            print_json(&json!({ "read": notification }))
        }
    }
}

/// Environment config with command-line overrides applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::from_env().context("invalid environment configuration")?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(dir) = config.log_dir.take() {
        config.log_dir = Some(absolute(&dir)?);
    }
    Ok(config)
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve current directory")?;
    Ok(cwd.join(path))
}

fn session(as_user: Option<Uuid>) -> anyhow::Result<Session> {
    match as_user {
        Some(user_id) => Ok(Session::new(user_id)),
        None => bail!("this command needs an acting user: pass --as <USER_ID> or set CONFLICTDESK_USER"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
