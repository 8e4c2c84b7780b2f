use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use vbtrs::config::{AppConfig, StorageBackend};
use vbtrs::error::PersistenceError;
use vbtrs::logging::init_logging;
use vbtrs::store::CALIBRATION_KEY;
use vbtrs::{
    CalculationInput, CalibrationStore, Exercise, ExerciseCalibration, KeyValueStore,
    LoadEstimator, Persisted, RegressionCoefficients, VbtError, ZoneCalculator,
};

/// vbtrs - Velocity-Based Training load calculator
///
/// Estimates 1RM and training loads from bar velocity using a linear
/// velocity/%1RM model per exercise, personalized from three calibration sets.
#[derive(Parser)]
#[command(name = "vbtrs")]
#[command(version)]
#[command(about = "Velocity-Based Training load calculator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Overrides the calibration database path
    #[arg(long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate 1RM and the load for a target intensity from one reading
    Estimate {
        /// Exercise (squat, bench, deadlift)
        #[arg(short, long)]
        exercise: Exercise,

        /// Load lifted in kg
        #[arg(short, long)]
        load: f64,

        /// Mean concentric velocity in m/s
        #[arg(short = 's', long)]
        velocity: f64,

        /// Target intensity as % of 1RM
        #[arg(short, long, default_value = "100")]
        target: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fit and save a personalized model from calibration sets at 90%, 85% and 75% 1RM
    Calibrate {
        /// Squat velocities at 90,85,75 %1RM
        #[arg(
            long,
            value_delimiter = ',',
            requires_all = ["bench", "deadlift"],
            conflicts_with = "file"
        )]
        squat: Option<Vec<f64>>,

        /// Bench press velocities at 90,85,75 %1RM
        #[arg(long, value_delimiter = ',')]
        bench: Option<Vec<f64>>,

        /// Deadlift velocities at 90,85,75 %1RM
        #[arg(long, value_delimiter = ',')]
        deadlift: Option<Vec<f64>>,

        /// Calibration file (TOML or JSON)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the stored calibration and the active model
    Show,

    /// Report whether personalized or generic values are in use
    Status,

    /// Remove the personalized calibration and return to generic values
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the configuration file
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write a configuration file with default values
        #[arg(short, long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Slope")]
    slope: String,
    #[tabled(rename = "Intercept")]
    intercept: String,
}

#[derive(Tabled)]
struct CalibrationRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "90% 1RM")]
    at_90: String,
    #[tabled(rename = "85% 1RM")]
    at_85: String,
    #[tabled(rename = "75% 1RM")]
    at_75: String,
}

type Store = CalibrationStore<Box<dyn KeyValueStore>>;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<VbtError>() {
            Some(vbt_err) => {
                tracing::debug!(
                    error = %vbt_err,
                    severity = ?vbt_err.severity(),
                    "Command failed"
                );
                eprintln!("{} {}", "✗".red().bold(), vbt_err.user_message().red());
                if vbt_err.is_retryable() {
                    eprintln!("{}", "  This may succeed if you try again.".dimmed());
                }
            }
            None => eprintln!("{} {:#}", "✗".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(&config_path)?;

    if let Some(database) = cli.database {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.database_path = database;
    }

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Estimate {
            exercise,
            load,
            velocity,
            target,
            json,
        } => {
            let store = open_store(&config)?;
            let input = CalculationInput {
                load,
                velocity,
                exercise,
                target_percentage: target,
            };
            estimate(&store, &input, json)
        }

        Commands::Calibrate {
            squat,
            bench,
            deadlift,
            file,
        } => {
            let calibration = match (file, squat, bench, deadlift) {
                (Some(path), _, _, _) => read_calibration_file(&path)?,
                (None, Some(squat), Some(bench), Some(deadlift)) => {
                    ExerciseCalibration::from_velocities(
                        three(&squat, "squat")?,
                        three(&bench, "bench")?,
                        three(&deadlift, "deadlift")?,
                    )
                }
                _ => bail!("Provide --file or all of --squat, --bench and --deadlift"),
            };

            let mut store = open_store(&config)?;
            calibrate(&mut store, &calibration)
        }

        Commands::Show => {
            let store = open_store(&config)?;
            show(&store)
        }

        Commands::Status => {
            let store = open_store(&config)?;
            print_status(&store);
            Ok(())
        }

        Commands::Clear { yes } => {
            let mut store = open_store(&config)?;
            let prompt = "Remove your personalized calibration and return to generic values?";
            if !yes && !confirm(prompt)? {
                println!("Cancelled");
                return Ok(());
            }
            store.clear().map_err(VbtError::from)?;
            println!("{}", "✓ Personalized calibration removed".green());
            Ok(())
        }

        Commands::Config { show, init, force } => {
            if init {
                if config_path.exists() && !force {
                    bail!(
                        "Config file already exists: {} (use --force to overwrite)",
                        config_path.display()
                    );
                }
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&config_path)?;
                println!("{} {}", "✓ Wrote".green(), config_path.display());
            }
            if show || !init {
                let content = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", content);
            }
            Ok(())
        }
    }
}

fn open_store(config: &AppConfig) -> Result<Store> {
    let backend = config.storage.open()?;
    Ok(CalibrationStore::new(backend, config.defaults))
}

fn estimate(store: &Store, input: &CalculationInput, json: bool) -> Result<()> {
    let coefficients = store.active_coefficients();
    let result = LoadEstimator::estimate(input, &coefficients).map_err(VbtError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let status = store.status();
    println!("{}", format!("{} · {}", input.exercise, status.message).dimmed());
    println!("  %1RM:            {:.1}%", result.percent1_rm);
    println!("  Estimated 1RM:   {}", format!("{:.1} kg", result.estimated_1rm).bold());
    println!(
        "  Load at {:.0}%:    {}",
        input.target_percentage,
        format!("{:.1} kg", result.estimated_load).green().bold()
    );

    let zone = ZoneCalculator::velocity_zone(input.exercise, input.velocity);
    let level = ZoneCalculator::intensity_level(result.percent1_rm);
    println!("  Velocity zone:   {} ({})", zone, zone.typical_range());
    println!("  Intensity:       {} - {}", level, level.description());

    if result.is_low_confidence() {
        println!(
            "{}",
            "⚠ Estimated intensity is outside 0-100% of 1RM; treat this result with caution"
                .yellow()
        );
    }

    Ok(())
}

fn calibrate(store: &mut Store, calibration: &ExerciseCalibration) -> Result<()> {
    let outcome = store.save(calibration).map_err(VbtError::from)?;

    println!("{}", model_table(&outcome.coefficients));

    match outcome.write_failure {
        None => println!(
            "{}",
            "✓ Calibration saved. Your personalized values will be used.".green()
        ),
        Some(err) => {
            let err = VbtError::from(err);
            println!("{} {}", "⚠".yellow(), err.user_message().yellow());
        }
    }
    Ok(())
}

fn show(store: &Store) -> Result<()> {
    print_status(store);

    match store.calibration_state().map_err(VbtError::from)? {
        Persisted::Present(calibration) => {
            let rows: Vec<CalibrationRow> = calibration
                .iter()
                .map(|(exercise, points)| CalibrationRow {
                    exercise: exercise.to_string(),
                    at_90: format!("{:.2} m/s", points[0].velocity),
                    at_85: format!("{:.2} m/s", points[1].velocity),
                    at_75: format!("{:.2} m/s", points[2].velocity),
                })
                .collect();
            println!("\n{}", "Calibration".bold());
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        Persisted::Absent => {}
        Persisted::Malformed { reason } => {
            let err = VbtError::from(PersistenceError::Malformed {
                key: CALIBRATION_KEY.to_string(),
                reason,
            });
            println!("{} {}", "⚠".yellow(), err.user_message().yellow());
        }
    }

    println!("\n{}", "Active model (%1RM = slope × velocity + intercept)".bold());
    println!("{}", model_table(&store.active_coefficients()));
    Ok(())
}

fn print_status(store: &Store) {
    let status = store.status();
    if status.is_personalized {
        println!("{} {}", "✓".green(), status.message.green());
    } else {
        println!("{} {}", "⚠".yellow(), status.message.yellow());
    }
}

fn model_table(coefficients: &RegressionCoefficients) -> String {
    let rows: Vec<ModelRow> = coefficients
        .iter()
        .map(|(exercise, model)| ModelRow {
            exercise: exercise.to_string(),
            slope: format!("{:.3}", model.slope),
            intercept: format!("{:.3}", model.intercept),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn three(values: &[f64], name: &str) -> Result<[f64; 3]> {
    <[f64; 3]>::try_from(values).map_err(|_| {
        anyhow::anyhow!("--{} expects exactly three velocities, got {}", name, values.len())
    })
}

fn read_calibration_file(path: &Path) -> Result<ExerciseCalibration> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read calibration file: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON calibration")
    } else {
        toml::from_str(&content).with_context(|| "Failed to parse TOML calibration")
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
