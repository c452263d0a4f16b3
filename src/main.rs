// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use bcc_dashboard::{import_predictions, logging, AppConfig, RecordStore, Repository};
use std::env;
use std::path::Path;

const USAGE: &str = "\
Usage: bcc-dashboard <command>

Commands:
  init          Create the database and media directories
  import <csv>  Validate and save predictions from a CSV file
  list          Print stored predictions and uploaded files
  admin         Browse stored records in the terminal";

fn main() -> Result<()> {
    logging::init_tracing();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("import") => match args.get(2) {
            Some(path) => run_import(Path::new(path)),
            None => {
                eprintln!("❌ Missing CSV path\n\n{}", USAGE);
                std::process::exit(2);
            }
        },
        Some("list") => run_list(),
        Some("admin") => run_admin(),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn open_store() -> Result<(AppConfig, RecordStore)> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let store = RecordStore::open(&config).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    Ok((config, store))
}

fn run_init() -> Result<()> {
    println!("🔧 Setting up storage...");
    let (config, store) = open_store()?;

    println!("✓ Database ready: {}", config.database_path.display());
    println!("✓ Upload directory: {}", store.blobs().upload_dir().display());
    Ok(())
}

fn run_import(csv_path: &Path) -> Result<()> {
    println!("📥 Importing predictions from {}", csv_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (_, store) = open_store()?;
    let report = import_predictions(&store, csv_path)?;

    println!("✓ Saved {} predictions", report.inserted);
    if !report.rejected.is_empty() {
        println!("⚠️  Skipped {} rows:", report.rejected.len());
        for row in &report.rejected {
            for error in row.errors.iter() {
                println!("   line {}: {}: {}", row.line, error.field, error.message);
            }
        }
    }

    let total = store.predictions().count()?;
    println!("\n✓ Database contains {} predictions", total);
    Ok(())
}

fn run_list() -> Result<()> {
    let (_, store) = open_store()?;

    let predictions = store.predictions().list()?;
    println!("📊 Predictions ({})", predictions.len());
    for p in &predictions {
        println!("   #{:<5} {}", p.id, p);
    }

    let uploads = store.uploads().list()?;
    println!("\n📁 Uploaded files ({})", uploads.len());
    for u in &uploads {
        println!("   #{:<5} {}  →  {} ({} bytes)", u.id, u, u.file_path, u.size_bytes);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_admin() -> Result<()> {
    let (_, store) = open_store()?;

    let predictions = store.predictions().list()?;
    let uploads = store.uploads().list()?;
    println!(
        "✓ Loaded {} predictions and {} uploaded files",
        predictions.len(),
        uploads.len()
    );

    let mut app = ui::App::new(predictions, uploads);
    ui::run_ui(&mut app)?;

    println!("\n✅ Admin console closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_admin() -> Result<()> {
    eprintln!("❌ Admin console not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
