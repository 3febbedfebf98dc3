use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use colored::Colorize;
use locus_access::{GrantVector, LocationAccess, LocationAccessFacade};
use serde_json::json;

use crate::cli::{CheckArgs, EncodeArgs, OutputFormat};
use crate::output::{print_json, print_warning};

pub async fn check(
    access: &LocationAccessFacade,
    args: &CheckArgs,
    format: OutputFormat,
) -> Result<()> {
    if let Err(e) = GrantVector::decode(&args.claim) {
        print_warning(&format!("{e}; the claim grants nothing"));
    }

    let claims = HashMap::from([(
        access.resolver().claim_name().to_string(),
        args.claim.clone(),
    )]);

    let all = access.is_granted_all(&claims);
    let granted = access
        .granted_ids(&claims)
        .await
        .context("Failed to resolve granted locations")?;
    let checks: BTreeMap<u64, bool> = args
        .ids
        .iter()
        .map(|&id| (id, access.is_granted(&claims, id)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&json!({
            "all": all,
            "granted_ids": granted,
            "checks": checks,
        })),
        OutputFormat::Table => {
            println!("{}: {}", "All locations".cyan(), if all { "yes" } else { "no" });
            let ids: Vec<String> = granted.iter().map(u64::to_string).collect();
            println!("{}: {}", "Granted".cyan(), ids.join(", "));
            for (id, ok) in checks {
                let verdict = if ok { "granted".green() } else { "denied".red() };
                println!("  {id}: {verdict}");
            }
            Ok(())
        }
    }
}

pub fn encode(args: &EncodeArgs, format: OutputFormat) -> Result<()> {
    let vector = GrantVector::encode(args.ids.iter().copied(), args.all)?;
    let claim = vector.to_base64();

    match format {
        OutputFormat::Json => print_json(&json!({
            "claim": claim,
            "all": vector.is_granted_all(),
            "granted_ids": vector.explicit_ids(),
        })),
        OutputFormat::Table => {
            println!("{claim}");
            Ok(())
        }
    }
}
