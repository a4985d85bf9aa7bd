//! coast-report - Submit a coastal hazard report

use anyhow::Result;
use clap::Parser;
use libcoastwatch::config::LocationConfig;
use libcoastwatch::logging::LoggingConfig;
use libcoastwatch::service::validation::{ValidationRequest, ValidationService};
use libcoastwatch::service::ReportForm;
use libcoastwatch::types::HAZARD_TYPES;
use libcoastwatch::{CoastwatchError, CoastwatchService, Config, Media};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coast-report")]
#[command(version, about = "Submit a coastal hazard report")]
#[command(long_about = r#"Submit a coastal hazard report to the Coastwatch backend.

The report carries your current coordinate (from [location] in the config
file, or --lat/--lng) and requires a login session (see coast-session).

EXAMPLES:
    coast-report --hazard-type flood "Water over the coast road"

    # Description from stdin, with a photo
    echo "Slick along the harbour wall" | coast-report -t oil_spill --image slick.jpg

    # Explicit coordinate
    coast-report -t ocean_trash --lat 13.0827 --lng 80.2707 "Nets washed up"

    coast-report --list-types

EXIT CODES:
    0 - Report submitted
    1 - Network, server or configuration error
    2 - Not logged in or session expired
    3 - Missing/invalid fields or no location
"#)]
struct Cli {
    /// Description of the hazard (reads from stdin if not provided)
    description: Option<String>,

    /// Hazard type id or name (see --list-types)
    #[arg(short = 't', long, value_name = "TYPE")]
    hazard_type: Option<String>,

    /// Photo to attach (jpg, png, gif or webp)
    #[arg(short, long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Latitude of the hazard (overrides the configured location)
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the hazard (overrides the configured location)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Print the hazard types that can be reported and exit
    #[arg(long)]
    list_types: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<CoastwatchError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_types {
        return list_types(&cli.format);
    }

    let description = match cli.description {
        Some(text) => text,
        None => read_stdin()?,
    };

    // Field problems are reported before the config, session or photo is read
    let hazard_type = ValidationService::new().check(&ValidationRequest {
        hazard_type: cli.hazard_type.clone(),
        description: description.clone(),
    })?;

    let mut config = Config::load()?;
    if let (Some(latitude), Some(longitude)) = (cli.lat, cli.lng) {
        config.location = Some(LocationConfig {
            latitude,
            longitude,
        });
    }
    let service = CoastwatchService::from_config(config)?;

    let mut form = ReportForm::new();
    form.hazard_type = Some(hazard_type);
    form.description = description;
    form.image = cli.image.as_deref().map(Media::from_path).transpose()?;
    service.report().prefill_location(&mut form);
    let location = form.location_text.clone();

    let receipt = service.report().submit(&mut form).await?;

    if cli.format == "json" {
        println!(
            "{}",
            serde_json::to_string(&json!({
                "success": true,
                "hazard_type": hazard_type.id,
                "location": location,
                "message": receipt.message,
            }))?
        );
    } else {
        println!("✓ Report submitted: {} at {}", hazard_type, location);
        if let Some(message) = receipt.message {
            println!("  {}", message);
        }
    }

    Ok(())
}

/// Read the description from piped stdin; a terminal yields nothing
fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(String::new());
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer.trim().to_string())
}

fn list_types(format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(HAZARD_TYPES)?);
    } else {
        for hazard in HAZARD_TYPES {
            println!("{:<18} {}", hazard.id, hazard);
        }
    }
    Ok(())
}
