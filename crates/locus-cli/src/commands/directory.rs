use anyhow::{Context, Result};
use locus_access::{LocationAccess, LocationAccessFacade, LocationRecord};

use crate::cli::OutputFormat;
use crate::output::{
    print_json, print_location, print_locations_table, print_success, print_warning,
};

pub async fn list(access: &LocationAccessFacade, refresh: bool, format: OutputFormat) -> Result<()> {
    let directory = if refresh {
        access.directory().refresh().await
    } else {
        access.list_all().await
    }
    .context("Failed to load the location directory")?;

    if directory.is_empty() {
        print_warning("Directory is empty; the backend may be unavailable");
    }

    let mut records: Vec<&LocationRecord> = directory.values().collect();
    records.sort_by_key(|r| r.id);

    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&records)?),
        OutputFormat::Table => {
            print_locations_table(&records);
            Ok(())
        }
    }
}

pub async fn show(access: &LocationAccessFacade, id: u64, format: OutputFormat) -> Result<()> {
    let Some(record) = access
        .find_by_id(id)
        .await
        .context("Failed to load the location directory")?
    else {
        anyhow::bail!("Location {id} not found");
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&record)?),
        OutputFormat::Table => {
            print_location(&record);
            Ok(())
        }
    }
}

pub async fn invalidate(access: &LocationAccessFacade) -> Result<()> {
    let cache = access.directory().cache();
    if !cache.is_enabled() {
        print_warning("Directory cache is disabled; nothing to invalidate");
        return Ok(());
    }
    access
        .directory()
        .invalidate()
        .await
        .context("Failed to invalidate the directory cache")?;
    print_success(&format!("Invalidated {}", cache.key()));
    Ok(())
}
