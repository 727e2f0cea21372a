//! Bulk-load the ingredient reference data from a JSON file.
//!
//! Expects the format shipped with the frontend fixtures:
//! `[{"name": "flour", "measurement_unit": "g"}, ...]`

use anyhow::{Context, Result};
use clap::Parser;
use diesel::prelude::*;
use foodgram_server::models::NewIngredient;
use foodgram_server::schema::ingredients;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "load-ingredients")]
#[command(about = "Load ingredient reference data into the database", long_about = None)]
struct Cli {
    /// Path to the ingredients JSON file
    file: PathBuf,

    /// Database URL (falls back to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
    };

    let contents = fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let records: Vec<IngredientRecord> =
        serde_json::from_str(&contents).context("Failed to parse ingredients JSON")?;

    let mut conn = PgConnection::establish(&database_url).context("Failed to connect")?;

    let rows: Vec<NewIngredient> = records
        .iter()
        .map(|record| NewIngredient {
            name: &record.name,
            measurement_unit: &record.measurement_unit,
        })
        .collect();

    // Re-running the loader must not duplicate existing rows
    let inserted = diesel::insert_into(ingredients::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(&mut conn)
        .context("Failed to insert ingredients")?;

    println!("Loaded {} of {} ingredients", inserted, records.len());

    Ok(())
}
