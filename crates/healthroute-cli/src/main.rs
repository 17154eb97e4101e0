//! HealthRoute command-line front end.
//!
//! Usage:
//! ```bash
//! # Import a sheet exported as JSON rows
//! healthroute import-labs --user u1 labs.json
//!
//! # Import text extracted from a PDF report
//! healthroute import-report --user u1 report.txt
//!
//! # Parse an assistant reply and store it
//! healthroute parse-plan --user u1 --save reply.md
//!
//! # Dashboard summary and CSV export
//! healthroute insights --user u1
//! healthroute export --user u1 --format csv
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use healthroute_core::config::{DB_PATH_VAR, DEFAULT_SEX_VAR, UNKNOWN_AS_NORMAL_VAR};
use healthroute_core::export::{ObservationExport, UserSnapshot};
use healthroute_core::labs::{ImportContext, LabImporter};
use healthroute_core::models::{MealPlanRecord, PlanSource, ReferenceRange};
use healthroute_core::{insights, init_logging, parse_week_plan, CoreConfig, Database};
use healthroute_llm::build_meal_plan_prompt;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "healthroute",
    about = "HealthRoute meal plans and lab results",
    long_about = "Import lab results, parse meal plans and inspect the local HealthRoute store."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database path
    #[arg(long, global = true, env = DB_PATH_VAR)]
    db: Option<String>,

    /// Sex used for stored reference ranges (male, female, any)
    #[arg(long, global = true, env = DEFAULT_SEX_VAR)]
    sex: Option<String>,

    /// Treat nutrients without a reference range as normal
    #[arg(long, global = true, env = UNKNOWN_AS_NORMAL_VAR)]
    unknown_as_normal: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import lab rows from a JSON array of objects
    ImportLabs {
        #[arg(long)]
        user: String,
        file: PathBuf,
    },

    /// Import findings from lab report text
    ImportReport {
        #[arg(long)]
        user: String,
        file: PathBuf,
    },

    /// Parse a meal plan reply and print it as JSON
    ParsePlan {
        file: PathBuf,

        /// Store the plan for this user
        #[arg(long, requires = "save")]
        user: Option<String>,

        #[arg(long, requires = "user")]
        save: bool,
    },

    /// Print the meal plan prompt for a user, including stored allergies
    PlanPrompt {
        #[arg(long)]
        user: String,
    },

    /// Add or update reference ranges from a JSON array
    UpsertRanges { file: PathBuf },

    /// List stored reference ranges
    Ranges,

    /// List a user's observations, newest first
    Observations {
        #[arg(long)]
        user: String,
    },

    /// Score, trend and latest status per nutrient
    Insights {
        #[arg(long)]
        user: String,
    },

    /// Export a user's data
    Export {
        #[arg(long)]
        user: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Export everything stored for the user (JSON only)
        #[arg(long)]
        snapshot: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

impl Cli {
    /// Settings from the command line, validated the same way as the environment.
    fn config(&self) -> Result<CoreConfig> {
        let config = CoreConfig::from_lookup(|key| match key {
            DB_PATH_VAR => self.db.clone(),
            DEFAULT_SEX_VAR => self.sex.clone(),
            UNKNOWN_AS_NORMAL_VAR => Some(self.unknown_as_normal.to_string()),
            _ => None,
        })?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = cli.config().context("Invalid configuration")?;
    let output = run(cli.command, &config)?;
    println!("{}", output);
    Ok(())
}

/// Execute one command and return what it prints.
fn run(command: Command, config: &CoreConfig) -> Result<String> {
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    match command {
        Command::ImportLabs { user, file } => {
            let json = read_file(&file)?;
            let ctx = import_context(user, &file);
            let outcome = importer(&db, config)?
                .import_json(&json, &ctx)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            let stored = db.insert_observations(&outcome.observations)?;
            info!(stored, skipped = outcome.skipped_rows, "Stored lab observations");
            Ok(serde_json::to_string_pretty(&outcome.observations)?)
        }

        Command::ImportReport { user, file } => {
            let text = read_file(&file)?;
            let ctx = import_context(user, &file);
            let (report, outcome) = importer(&db, config)?.import_report(&text, &ctx);
            db.insert_observations(&outcome.observations)?;
            Ok(serde_json::to_string_pretty(&serde_json::json!({
                "info": report.info,
                "observations": outcome.observations,
            }))?)
        }

        Command::ParsePlan { file, user, save } => {
            let plan = parse_week_plan(&read_file(&file)?);
            if let (true, Some(user)) = (save, user) {
                let record = MealPlanRecord::new(user, PlanSource::Import, plan.clone());
                db.save_meal_plan(&record)?;
                info!(id = %record.id, meals = plan.meal_count(), "Saved meal plan");
            }
            Ok(serde_json::to_string_pretty(&plan)?)
        }

        Command::PlanPrompt { user } => {
            let allergies = db.latest_allergens(&user)?;
            Ok(build_meal_plan_prompt(&[], &allergies))
        }

        Command::UpsertRanges { file } => {
            let ranges: Vec<ReferenceRange> = serde_json::from_str(&read_file(&file)?)
                .with_context(|| format!("Invalid reference ranges in {}", file.display()))?;
            let count = db.upsert_reference_ranges(&ranges)?;
            Ok(format!("Upserted {} reference ranges", count))
        }

        Command::Ranges => Ok(serde_json::to_string_pretty(&db.list_reference_ranges()?)?),

        Command::Observations { user } => {
            Ok(serde_json::to_string_pretty(&db.list_observations(&user)?)?)
        }

        Command::Insights { user } => {
            let observations = db.list_observations(&user)?;
            let mut lines = vec![
                format!("Score: {}", insights::nutrient_score(&observations)),
                format!("Trend: {}", insights::score_trend(&observations)),
            ];
            for obs in insights::latest_by_nutrient(&observations) {
                lines.push(format!(
                    "[{}] {}",
                    insights::status_title(obs.status),
                    insights::status_message(obs)
                ));
            }
            Ok(lines.join("\n"))
        }

        Command::Export {
            user,
            format,
            snapshot,
        } => match (format, snapshot) {
            (ExportFormat::Csv, true) => bail!("Snapshots are only available as JSON"),
            (ExportFormat::Json, true) => Ok(UserSnapshot::collect(&db, &user)?.to_json()?),
            (ExportFormat::Json, false) => Ok(ObservationExport::for_user(&db, &user)?.to_json()?),
            (ExportFormat::Csv, false) => Ok(ObservationExport::for_user(&db, &user)?.to_csv()),
        },
    }
}

fn importer(db: &Database, config: &CoreConfig) -> Result<LabImporter> {
    let table = db
        .reference_table()
        .context("Failed to load reference ranges")?;
    Ok(LabImporter::new(config.classifier(table)))
}

fn import_context(user: String, file: &Path) -> ImportContext {
    let ctx = ImportContext::new(user);
    match file.file_name().and_then(|name| name.to_str()) {
        Some(name) => ctx.with_file_name(name),
        None => ctx,
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
