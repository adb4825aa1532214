//! `feedback` command line entry point.
//!
//! # Responsibility
//! - Run the store operations against the configured document database.
//! - Host the one-shot admin commands (`seed`, `rules`).
//!
//! # Invariants
//! - With `mode = local` the store commands never open the database file.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feedback_core::{
    category_slug, default_log_level, init_logging, rules_instructions, security_rules,
    seed_store, DataSource, FallbackReason, FeedbackStore, ModeSetting, SqliteDocumentRepository,
    StoreConfig,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const QUIET_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "feedback", version, about = "Manage feedback items and their categories")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured mode
    #[arg(long, value_enum, global = true)]
    mode: Option<ModeArg>,

    /// Override the configured database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr otherwise
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Local,
    Remote,
    Auto,
}

impl From<ModeArg> for ModeSetting {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Local => Self::Local,
            ModeArg::Remote => Self::Remote,
            ModeArg::Auto => Self::Auto,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Store(StoreCommand),
    /// Write the fixed seed categories and feedback
    Seed,
    /// Print the security rules for manual application
    Rules,
}

/// Commands served by the feedback store.
#[derive(Subcommand)]
enum StoreCommand {
    /// List categories
    Categories,
    /// List feedback items
    Feedback,
    /// Add (or overwrite) a category
    AddCategory {
        /// Display name
        name: String,
        /// Document key; derived from the name when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Add a feedback item
    AddFeedback {
        text: String,
        /// Category id; repeat for several
        #[arg(short = 'C', long = "category")]
        categories: Vec<String>,
    },
    /// Delete a category and remove it from every feedback item
    DeleteCategory { id: String },
    /// Delete one feedback item
    DeleteFeedback { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let level = match (&cli.log_level, &cli.log_dir) {
        (Some(level), _) => level.as_str(),
        (None, Some(_)) => default_log_level(),
        (None, None) => QUIET_LOG_LEVEL,
    };
    init_logging(level, cli.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let config = load_config(&cli)?;

    match cli.command {
        Command::Rules => {
            println!("{}", security_rules(&config.collections));
            println!();
            println!("{}", rules_instructions(&config.project_id));
            Ok(())
        }
        Command::Seed => seed(&open_database(&config)?, &config).await,
        Command::Store(command) => {
            let store = FeedbackStore::from_config(open_store_repository(&config)?, &config);
            info!(
                "event=cli_start module=cli status=ok project_id={} mode={}",
                config.project_id,
                store.mode().as_str()
            );
            run_store_command(&store, command, cli.json).await
        }
    }
}

async fn run_store_command(
    store: &FeedbackStore<SqliteDocumentRepository>,
    command: StoreCommand,
    json: bool,
) -> Result<()> {
    match command {
        StoreCommand::Categories => {
            let loaded = store.load_categories_with_source().await;
            note_source(loaded.source);
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.items)?);
            } else {
                for category in &loaded.items {
                    println!("{}\t{}", category.id, category.name);
                }
            }
        }
        StoreCommand::Feedback => {
            let loaded = store.load_feedback_with_source().await;
            note_source(loaded.source);
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.items)?);
            } else {
                let categories = store.load_categories().await;
                for item in &loaded.items {
                    let labels: Vec<String> = item
                        .category_labels(&categories)
                        .iter()
                        .map(|label| label.display_name().to_string())
                        .collect();
                    println!("{}\t[{}]\t{}", item.id, labels.join(", "), item.text);
                }
            }
        }
        StoreCommand::AddCategory { name, id } => {
            let id = match id {
                Some(id) => id,
                None => category_slug(&name),
            };
            if id.is_empty() {
                bail!("cannot derive a category id from `{name}`; pass --id");
            }
            let category = store.add_category(name, id).await?;
            print_created(json, &category, &category.id)?;
        }
        StoreCommand::AddFeedback { text, categories } => {
            let item = store.add_feedback(text, categories).await?;
            print_created(json, &item, &item.id)?;
        }
        StoreCommand::DeleteCategory { id } => {
            store.delete_category(&id).await?;
            println!("deleted category {id}");
        }
        StoreCommand::DeleteFeedback { id } => {
            store.delete_feedback(&id).await?;
            println!("deleted feedback {id}");
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_database(config: &StoreConfig) -> Result<SqliteDocumentRepository> {
    SqliteDocumentRepository::open(&config.database_path).with_context(|| {
        format!(
            "failed to open document database `{}`",
            config.database_path.display()
        )
    })
}

/// Local mode is served from the fixtures, so the store gets a private
/// in-memory repository instead of the configured file.
fn open_store_repository(config: &StoreConfig) -> Result<SqliteDocumentRepository> {
    if config.mode == ModeSetting::Local {
        return Ok(SqliteDocumentRepository::open_in_memory()?);
    }
    open_database(config)
}

async fn seed(repo: &SqliteDocumentRepository, config: &StoreConfig) -> Result<()> {
    info!(
        "event=seed module=cli status=start project_id={} credential={}",
        config.project_id,
        if config.credential.is_some() {
            "configured"
        } else {
            "absent"
        }
    );

    let report = seed_store(repo, &config.collections).await;
    println!(
        "seeded {} categories and {} feedback items",
        report.categories_written, report.feedback_written
    );
    for failure in &report.failures {
        eprintln!(
            "failed to seed {}: {}",
            failure.step.as_str(),
            error_chain(&failure.error)
        );
    }
    if !report.is_complete() {
        bail!("seeding finished with {} failed step(s)", report.failures.len());
    }
    Ok(())
}

/// Renders an error and its sources as `outer: inner: ...`.
fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn note_source(source: DataSource) {
    match source {
        DataSource::Fallback(FallbackReason::ReadFailed) => {
            eprintln!("note: database read failed; showing placeholder data")
        }
        DataSource::Fallback(FallbackReason::Empty) => {
            eprintln!("note: collection is empty; showing placeholder data")
        }
        DataSource::Mock => eprintln!("note: local mode; showing placeholder data"),
        DataSource::Remote => {}
    }
}

fn print_created<T: serde::Serialize>(json: bool, value: &T, id: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_core::{DocumentRepository, RepoError};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("feedback").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_options_parse_after_the_subcommand() {
        let cli = parse(&[
            "categories",
            "--mode",
            "local",
            "--database",
            "/tmp/store.sqlite3",
            "--json",
        ]);
        assert!(matches!(
            cli.command,
            Command::Store(StoreCommand::Categories)
        ));
        assert!(matches!(cli.mode, Some(ModeArg::Local)));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/store.sqlite3")));
        assert!(cli.json);
    }

    #[test]
    fn add_feedback_collects_repeated_categories() {
        let cli = parse(&[
            "add-feedback",
            "Great pacing",
            "-C",
            "time-management",
            "--category",
            "assessment",
        ]);
        match cli.command {
            Command::Store(StoreCommand::AddFeedback { text, categories }) => {
                assert_eq!(text, "Great pacing");
                assert_eq!(categories, vec!["time-management", "assessment"]);
            }
            _ => panic!("expected add-feedback"),
        }
    }

    #[test]
    fn admin_commands_stay_outside_the_store_group() {
        assert!(matches!(parse(&["seed"]).command, Command::Seed));
        assert!(matches!(parse(&["rules"]).command, Command::Rules));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["feedback", "--mode", "cloud", "feedback"]).is_err());
    }

    #[test]
    fn cli_overrides_replace_config_values() {
        let cli = parse(&["--mode", "remote", "--database", "override.sqlite3", "rules"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.mode, ModeSetting::Remote);
        assert_eq!(config.database_path, PathBuf::from("override.sqlite3"));
    }

    #[tokio::test]
    async fn local_mode_never_opens_the_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let unopenable = dir.path().join("missing-dir").join("store.sqlite3");
        let database = unopenable.to_str().unwrap();

        for command in ["categories", "feedback"] {
            run(parse(&["--mode", "local", "--database", database, command]))
                .await
                .unwrap();
        }
        run(parse(&["--mode", "local", "--database", database, "add-category", "Foo"]))
            .await
            .unwrap();
        run(parse(&["--mode", "local", "--database", database, "delete-feedback", "mock-1"]))
            .await
            .unwrap();

        assert!(!unopenable.exists());
        assert!(!dir.path().join("missing-dir").exists());
    }

    #[tokio::test]
    async fn remote_mode_reports_an_unopenable_database() {
        let dir = tempfile::tempdir().unwrap();
        let unopenable = dir.path().join("missing-dir").join("store.sqlite3");

        let err = run(parse(&[
            "--mode",
            "remote",
            "--database",
            unopenable.to_str().unwrap(),
            "categories",
        ]))
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("failed to open document database"));
    }

    #[tokio::test]
    async fn remote_mode_writes_to_the_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        let database = path.to_str().unwrap();

        run(parse(&["--mode", "remote", "--database", database, "add-category", "Foo Bar"]))
            .await
            .unwrap();

        let repo = SqliteDocumentRepository::open(&path).unwrap();
        let stored = repo
            .get_document("feedback_site/data/categories", "foo-bar")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.str_field("name"), Some("Foo Bar"));
    }

    #[test]
    fn error_chain_lists_each_cause_once() {
        let err = feedback_core::StoreError::Write {
            operation: "delete_feedback",
            source: RepoError::Unavailable("offline".to_string()),
        };
        assert_eq!(
            error_chain(&err),
            "delete_feedback failed: document store unavailable: offline"
        );
    }
}
