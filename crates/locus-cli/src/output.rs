use anyhow::Result;
use colored::Colorize;
use locus_access::LocationRecord;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Renders locations as a table, one row per location.
pub fn print_locations_table(records: &[&LocationRecord]) {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Active", "Country", "Province", "Zip"]);
    for record in records {
        builder.push_record([
            record.id.to_string(),
            record.name.clone(),
            yes_no(record.active).to_string(),
            or_dash(record.address.country_code.as_deref()).to_string(),
            or_dash(record.address.province_code.as_deref()).to_string(),
            or_dash(record.address.zip.as_deref()).to_string(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    println!("Total: {}", records.len());
}

/// Renders one location as labelled lines.
pub fn print_location(record: &LocationRecord) {
    let address = &record.address;
    println!("{} {}", "Location:".cyan(), record.id.to_string().cyan());
    println!("{}: {}", "Name".cyan(), record.name);
    println!("{}: {}", "Active".cyan(), yes_no(record.active));
    if let Some(at) = record.deactivated_at {
        println!("{}: {at}", "Deactivated".cyan());
    }
    println!("{}: {}", "Phone".cyan(), or_dash(address.phone.as_deref()));
    println!("{}: {}", "Address".cyan(), or_dash(address.address1.as_deref()));
    if let Some(line) = address.address2.as_deref() {
        println!("         {line}");
    }
    println!(
        "{}: {} {} {}",
        "Region".cyan(),
        or_dash(address.zip.as_deref()),
        or_dash(address.province.as_deref()),
        or_dash(address.country.as_deref().or(address.country_code.as_deref()))
    );
    println!(
        "{}: {}",
        "Address verified".cyan(),
        yes_no(record.address_verified)
    );
    for attribute in &record.custom_attributes {
        println!("{}: {}", attribute.key.cyan(), attribute.value);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
