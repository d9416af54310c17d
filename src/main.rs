use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod color;
mod error;
mod extract;
mod grades;
mod logging;
mod models;
mod report;
mod store;

use models::GradeRecord;

#[derive(Parser)]
#[command(name = "gradeboard")]
#[command(about = "Grade table with weighted averages per subject", long_about = None)]
struct Cli {
    /// Flat JSON list of grades
    #[arg(long, global = true, env = "GRADES_FILE", default_value = "grades.json")]
    store: PathBuf,
    /// Log level (error, warn, info, debug, trace); falls back to RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a raw grade export into the store
    Extract {
        #[arg(long, default_value = "raw.json")]
        raw: PathBuf,
        /// Shell command that refreshes the raw export first
        #[arg(long)]
        helper: Option<String>,
        #[arg(long, requires = "helper")]
        helper_dir: Option<PathBuf>,
    },
    /// Append grades from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the coloured grade table
    Show {
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// One line per subject with its average
    Summary {
        #[arg(long)]
        since_days: Option<i64>,
    },
}

fn load_window(path: &Path, since_days: Option<i64>) -> anyhow::Result<Vec<GradeRecord>> {
    let records = store::load(path)?;
    Ok(match since_days {
        Some(days) => grades::edited_since(&records, grades::cutoff_timestamp(days)),
        None => records,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    match cli.command {
        Commands::Extract {
            raw,
            helper,
            helper_dir,
        } => {
            if let Some(command) = helper.as_deref() {
                extract::run_helper(command, helper_dir.as_deref())?;
            }
            let records = extract::extract_file(&raw)?;
            store::save(&cli.store, &records)?;
            println!("Saved {} grades to {}.", records.len(), cli.store.display());
        }
        Commands::Import { csv } => {
            let inserted = store::import_csv(&cli.store, &csv)?;
            println!("Inserted {inserted} grades from {}.", csv.display());
        }
        Commands::Show { since_days, out } => {
            let records = load_window(&cli.store, since_days)?;
            let groups = grades::group(&records);
            let table = report::render_table(&groups, &color::DEFAULT_PALETTE);

            match out {
                Some(out) => {
                    std::fs::write(&out, format!("{table}\n"))
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Table written to {}.", out.display());
                }
                None => println!("{table}"),
            }
        }
        Commands::Summary { since_days } => {
            let records = load_window(&cli.store, since_days)?;
            let summaries = grades::summarize(&grades::group(&records));
            print!("{}", report::build_summary(&summaries));
        }
    }

    Ok(())
}
