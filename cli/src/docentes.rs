//! # Docentes Console
//!
//! Command-line front end for the teacher registry. Every subcommand maps onto
//! one controller or session operation of `lib_edudata`:
//!
//! - `list [--filter TERM]`: load and print the collection.
//! - `create`, `update --id`: fill a draft and submit it.
//! - `delete --id [--yes]`: delete after a yes/no prompt.
//! - `login`, `guest`, `validate`, `logout`: manage the stored session.
//!
//! Configuration is layered: defaults, `edudata.json`, `EDUDATA_*` environment
//! (after loading `.env`), then the flags below.

#![forbid(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use lib_edudata::loggers::{init_tracing, ConsoleNotifier, LogFormat};
use lib_edudata::resources::{
    Confirmation, DeleteOutcome, DocenteController, DocenteField, DocenteId, FixedAnswer,
    ResourceController,
};
use lib_edudata::session::{
    CredentialProvider, SessionExpiredHandler, Session, StaticToken, StoredCredentials,
};
use lib_edudata::{ApiClient, ClientConfig, Docente, FileStore};

#[derive(Parser)]
#[clap(
    name = "docentes",
    version,
    about = "Manage the teacher registry of an EduData backend."
)]
struct Cli {
    /// JSON configuration file (defaults to ./edudata.json when present).
    #[clap(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Overrides the API base address, e.g. http://localhost:8081/api.
    #[clap(long, global = true)]
    base_url: Option<String>,

    /// Overrides the request timeout in seconds.
    #[clap(long, global = true)]
    timeout: Option<u64>,

    /// Overrides the session file location.
    #[clap(long, global = true)]
    session_file: Option<PathBuf>,

    /// Uses this bearer token instead of the stored session.
    #[clap(long, env = "EDUDATA_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Disables colored notifications.
    #[clap(long, global = true)]
    plain: bool,

    /// Emits diagnostics as JSON lines on stderr.
    #[clap(long, global = true)]
    json_logs: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists teachers, optionally narrowed by name, identification or email.
    List {
        #[clap(long, short = 'f')]
        filter: Option<String>,
    },
    /// Registers a new teacher.
    Create(DocenteArgs),
    /// Edits an existing teacher; omitted fields keep their current value.
    Update {
        #[clap(long)]
        id: String,
        #[clap(flatten)]
        fields: DocenteArgs,
    },
    /// Deletes a teacher after confirmation.
    Delete {
        #[clap(long)]
        id: String,
        /// Skips the confirmation prompt.
        #[clap(long, short = 'y')]
        yes: bool,
    },
    /// Logs in and stores the session.
    Login {
        #[clap(long, short = 'u')]
        username: String,
        #[clap(long, short = 'p', env = "EDUDATA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Obtains a temporary guest session.
    Guest,
    /// Checks the stored session against the server.
    Validate,
    /// Forgets the stored session.
    Logout,
}

#[derive(Args, Default)]
struct DocenteArgs {
    /// Digits only, at most 10; other characters are dropped.
    #[clap(long)]
    identificacion: Option<String>,
    #[clap(long)]
    nombre: Option<String>,
    #[clap(long)]
    email: Option<String>,
    #[clap(long)]
    especialidad: Option<String>,
}

impl DocenteArgs {
    fn values(&self) -> [(DocenteField, Option<&String>); 4] {
        [
            (DocenteField::Identificacion, self.identificacion.as_ref()),
            (DocenteField::Nombre, self.nombre.as_ref()),
            (DocenteField::Email, self.email.as_ref()),
            (DocenteField::Especialidad, self.especialidad.as_ref()),
        ]
    }

    fn apply(&self, controller: &mut DocenteController) {
        for (field, value) in self.values() {
            if let Some(value) = value {
                controller.update_field(field, value);
            }
        }
    }
}

/// Reads a yes/no answer from the terminal.
struct StdinConfirm;

impl Confirmation for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [s/N] ", prompt.bold());
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "si" | "sí" | "y" | "yes"
        )
    }
}

/// Tells the operator how to log in again after a `401`.
struct LoginHint;

impl SessionExpiredHandler for LoginHint {
    fn on_session_expired(&self, login_route: &str) {
        eprintln!(
            "{} {}",
            "La sesión expiró.".yellow().bold(),
            format!("Inicie sesión de nuevo con `docentes login` ({}).", login_route).yellow()
        );
    }
}

fn load_dotenv() {
    let dotenv_os: &str = if cfg!(target_os = "windows") {
        ".env.windows"
    } else {
        ".env.linux"
    };
    dotenvy::dotenv().ok();
    dotenvy::from_filename(dotenv_os).ok();
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.as_deref()).context("Loading configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(secs) = cli.timeout {
        anyhow::ensure!(secs > 0, "--timeout must be at least 1 second");
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(path) = &cli.session_file {
        config.session_file = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_table(rows: &[&Docente]) {
    if rows.is_empty() {
        println!("{}", "No se encontraron docentes".dimmed());
        return;
    }
    println!(
        "{:<8} {:<12} {:<28} {:<30} {}",
        "ID".bold(),
        "Identif.".bold(),
        "Nombre".bold(),
        "Email".bold(),
        "Especialidad".bold()
    );
    for d in rows {
        let id = d.id.as_ref().map(ToString::to_string).unwrap_or_default();
        println!(
            "{:<8} {:<12} {:<28} {:<30} {}",
            id, d.identificacion, d.nombre, d.email, d.especialidad
        );
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    debug!(%config, "Configuration resolved");

    let store = Arc::new(match &config.session_file {
        Some(path) => FileStore::new(path),
        None => FileStore::in_data_dir()?,
    });
    let credentials: Arc<dyn CredentialProvider> = match &cli.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(StoredCredentials::new(store.clone())),
    };
    let client = ApiClient::new(&config, credentials, Arc::new(LoginHint))?;

    let confirmation: Arc<dyn Confirmation> = match &cli.command {
        Command::Delete { yes: true, .. } => Arc::new(FixedAnswer(true)),
        _ => Arc::new(StdinConfirm),
    };
    let notifier = Arc::new(ConsoleNotifier::new(cli.plain));
    let mut controller: DocenteController =
        ResourceController::new(client.clone(), notifier, confirmation);
    let session = Session::new(client, store.clone());

    // Controller failures are already reported to the operator.
    let failed = ExitCode::FAILURE;
    match cli.command {
        Command::List { filter } => {
            if controller.load().await.is_err() {
                return Ok(failed);
            }
            if let Some(term) = filter {
                controller.set_filter(term);
            }
            print_table(&controller.filtered());
        }
        Command::Create(fields) => {
            controller.toggle_form();
            fields.apply(&mut controller);
            if controller.submit().await.is_err() {
                return Ok(failed);
            }
        }
        Command::Update { id, fields } => {
            if controller.load().await.is_err() {
                return Ok(failed);
            }
            let id: DocenteId = id.parse()?;
            controller.begin_edit_by_id(&id)?;
            fields.apply(&mut controller);
            if controller.submit().await.is_err() {
                return Ok(failed);
            }
        }
        Command::Delete { id, .. } => {
            let id: DocenteId = id.parse()?;
            match controller.delete(&id).await {
                Ok(DeleteOutcome::Deleted) => {}
                Ok(DeleteOutcome::Declined) => println!("{}", "Operación cancelada".dimmed()),
                Err(_) => return Ok(failed),
            }
        }
        Command::Login { username, password } => {
            let profile = session.login(&username, &password).await?;
            println!("{} {}", "Sesión iniciada:".green().bold(), profile);
        }
        Command::Guest => {
            let profile = session.login_as_guest().await?;
            println!("{} {}", "Sesión de invitado:".green().bold(), profile);
        }
        Command::Validate => {
            if !session.is_logged_in()? && cli.token.is_none() {
                println!("{}", "No hay sesión almacenada".yellow());
                return Ok(failed);
            }
            if session.validate().await? {
                let user = session
                    .user()?
                    .map(|u| serde_json::to_string(&u))
                    .transpose()?
                    .unwrap_or_default();
                println!("{} {}", "Sesión válida".green().bold(), user);
            } else {
                return Ok(failed);
            }
        }
        Command::Logout => {
            session.logout()?;
            println!("{} ({})", "Sesión cerrada".green(), store.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, "warn");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
