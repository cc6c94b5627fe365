//! Conscient CLI - Command-line interface for the Conscient engine
//!
//! Commands:
//! - analyze: Score a post (optionally folding it into the stored profile)
//! - profile: Print the current profile snapshot
//! - pattern: Print the pattern graph
//! - history: Print or clear the analysis history
//! - reset: Reset profiles, pattern and event log
//! - catalog: List the built-in sample posts
//! - doctor: Diagnose configuration and stored state

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use conscient_engine::catalog;
use conscient_engine::storage::{FileStore, PersistenceGateway, StorageKey};
use conscient_engine::types::{
    AnalysisResult, DistortionVector, InfluenceVector, IntegratedPattern, InteractionEvent,
    InteractionMetrics, Post,
};
use conscient_engine::{ConscientEngine, EngineConfig, EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// Conscient - on-device persuasion exposure engine
#[derive(Parser)]
#[command(name = "conscient")]
#[command(author = "Boundier")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score posts for persuasion cues and track exposure patterns", long_about = None)]
struct Cli {
    /// State file holding profiles, pattern and history
    #[arg(long, global = true, default_value = "conscient-state.json")]
    store: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "json-pretty")]
    format: OutputFormat,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a post
    Analyze {
        /// Post JSON file (use - for stdin)
        #[arg(long, conflicts_with = "catalog_id")]
        post: Option<PathBuf>,

        /// Id of a built-in sample post
        #[arg(long)]
        catalog_id: Option<String>,

        /// Interaction JSON file; the simulated viewing is used when omitted
        #[arg(long)]
        interaction: Option<PathBuf>,

        /// Fold the result into the stored profile, pattern and history
        #[arg(long)]
        apply: bool,
    },

    /// Print the current profile snapshot
    Profile,

    /// Print the pattern graph
    Pattern {
        /// Print only recorded points, never placeholders
        #[arg(long)]
        stored: bool,
    },

    /// Print the analysis history
    History {
        /// Clear the history instead of printing it
        #[arg(long)]
        clear: bool,
    },

    /// Reset profiles, pattern and event log (history is kept)
    Reset,

    /// List the built-in sample posts
    Catalog,

    /// Diagnose configuration and stored state
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ConscientCliError> {
    let format = cli.format;

    match cli.command {
        Commands::Analyze {
            post,
            catalog_id,
            interaction,
            apply,
        } => {
            let mut engine = open_engine(&cli.store, cli.config.as_deref())?;
            cmd_analyze(
                &mut engine,
                post.as_deref(),
                catalog_id.as_deref(),
                interaction.as_deref(),
                apply,
                &format,
            )
        }

        Commands::Profile => {
            let engine = open_engine(&cli.store, cli.config.as_deref())?;
            print_json(&engine.snapshot(), &format)
        }

        Commands::Pattern { stored } => {
            let engine = open_engine(&cli.store, cli.config.as_deref())?;
            let points = if stored {
                engine.stored_pattern()
            } else {
                engine.pattern_graph()
            };
            print_json(&points, &format)
        }

        Commands::History { clear } => {
            let mut engine = open_engine(&cli.store, cli.config.as_deref())?;
            if clear {
                engine.clear_history()?;
                Ok(())
            } else {
                print_json(&engine.history(), &format)
            }
        }

        Commands::Reset => {
            let mut engine = open_engine(&cli.store, cli.config.as_deref())?;
            engine.reset_data()?;
            Ok(())
        }

        Commands::Catalog => print_json(&catalog::sample_posts(), &format),

        Commands::Doctor { json } => cmd_doctor(&cli.store, cli.config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConscientCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn open_engine(
    store: &Path,
    config: Option<&Path>,
) -> Result<ConscientEngine<FileStore>, ConscientCliError> {
    let config = load_config(config)?;
    Ok(ConscientEngine::open_file(store, config)?)
}

fn read_input(path: &Path) -> Result<String, ConscientCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn cmd_analyze(
    engine: &mut ConscientEngine<FileStore>,
    post_path: Option<&Path>,
    catalog_id: Option<&str>,
    interaction_path: Option<&Path>,
    apply: bool,
    format: &OutputFormat,
) -> Result<(), ConscientCliError> {
    let post: Post = match (post_path, catalog_id) {
        (Some(path), _) => serde_json::from_str(&read_input(path)?)?,
        (None, Some(id)) => {
            catalog::find(id).ok_or_else(|| ConscientCliError::UnknownPost(id.to_string()))?
        }
        (None, None) => return Err(ConscientCliError::MissingPost),
    };

    let interaction: InteractionMetrics = match interaction_path {
        Some(path) => serde_json::from_str(&read_input(path)?)?,
        None => InteractionMetrics::simulated(),
    };

    let result = if apply {
        engine.process(&post, &interaction)?
    } else {
        engine.analyze(&post, &interaction)
    };

    print_json(&result, format)
}

fn cmd_doctor(store: &Path, config: Option<&Path>, json: bool) -> Result<(), ConscientCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Conscient version {}", ENGINE_VERSION),
    });

    // Check config file if provided
    match config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid ({} rules, alpha {}, pattern capacity {})",
                    config.rules.rules.len(),
                    config.smoothing_alpha,
                    config.pattern_capacity
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    // Check the state file and every key in it
    if !store.exists() {
        checks.push(DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist (first run)", store.display()),
        });
    } else {
        match FileStore::open(store) {
            Ok(file_store) if file_store.recovered_from_corruption() => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Error,
                message: format!("{} is not a valid state document", store.display()),
            }),
            Ok(file_store) => {
                checks.push(DoctorCheck {
                    name: "store".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("{} opened", store.display()),
                });

                let gateway = PersistenceGateway::new(file_store);
                checks.push(check_key::<Vec<InteractionEvent>>(&gateway, StorageKey::Events));
                checks.push(check_key::<InfluenceVector>(&gateway, StorageKey::Profile));
                checks.push(check_key::<DistortionVector>(&gateway, StorageKey::Distortion));
                checks.push(check_key::<Vec<IntegratedPattern>>(&gateway, StorageKey::Pattern));
                checks.push(check_key::<Vec<AnalysisResult>>(&gateway, StorageKey::History));
            }
            Err(e) => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read state file: {}", e),
            }),
        }
    }

    // Check stdin is available (for `analyze --post -`)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (post input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Conscient Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ConscientCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_key<T: DeserializeOwned>(gateway: &PersistenceGateway<FileStore>, key: StorageKey) -> DoctorCheck {
    match gateway.try_get::<T>(key) {
        Ok(Some(_)) => DoctorCheck {
            name: key.as_str().to_string(),
            status: CheckStatus::Ok,
            message: "valid".to_string(),
        },
        Ok(None) => DoctorCheck {
            name: key.as_str().to_string(),
            status: CheckStatus::Ok,
            message: "not set (defaults apply)".to_string(),
        },
        Err(e) => DoctorCheck {
            name: key.as_str().to_string(),
            status: CheckStatus::Warning,
            message: format!("{} (defaults apply)", e),
        },
    }
}

// Helper functions

fn print_json<T: Serialize + ?Sized>(value: &T, format: &OutputFormat) -> Result<(), ConscientCliError> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", output);
    Ok(())
}

// Error types

#[derive(Debug)]
enum ConscientCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    UnknownPost(String),
    MissingPost,
    DoctorFailed,
}

impl From<io::Error> for ConscientCliError {
    fn from(e: io::Error) -> Self {
        ConscientCliError::Io(e)
    }
}

impl From<EngineError> for ConscientCliError {
    fn from(e: EngineError) -> Self {
        ConscientCliError::Engine(e)
    }
}

impl From<serde_json::Error> for ConscientCliError {
    fn from(e: serde_json::Error) -> Self {
        ConscientCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ConscientCliError> for CliError {
    fn from(e: ConscientCliError) -> Self {
        match e {
            ConscientCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ConscientCliError::Engine(e @ EngineError::InvalidConfig(_))
            | ConscientCliError::Engine(e @ EngineError::InvalidRule(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'conscient doctor --config <file>' for details".to_string()),
            },
            ConscientCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'conscient doctor' to inspect the state file".to_string()),
            },
            ConscientCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax and field names".to_string()),
            },
            ConscientCliError::UnknownPost(id) => CliError {
                code: "UNKNOWN_POST".to_string(),
                message: format!("No sample post with id '{}'", id),
                hint: Some("Run 'conscient catalog' to list sample posts".to_string()),
            },
            ConscientCliError::MissingPost => CliError {
                code: "MISSING_POST".to_string(),
                message: "No post given".to_string(),
                hint: Some("Pass --post <file> or --catalog-id <id>".to_string()),
            },
            ConscientCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
