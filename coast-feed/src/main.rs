//! coast-feed - Browse community hazard reports

use anyhow::Result;
use clap::Parser;
use libcoastwatch::logging::LoggingConfig;
use libcoastwatch::service::{Analytics, Period};
use libcoastwatch::{CoastwatchError, CoastwatchService, Config, FeedItem};

#[derive(Parser, Debug)]
#[command(name = "coast-feed")]
#[command(version, about = "Browse community hazard reports")]
#[command(long_about = r#"Fetch the community hazard feed and print it.

EXAMPLES:
    # Latest reports
    coast-feed

    # Filter by hazard type or location label (case-insensitive)
    coast-feed --search oil
    coast-feed --search "lat: 13.0"

    # Scripting
    coast-feed --format json | jq '.[] | select(.severity == "high") | .id'
    coast-feed --format jsonl
    coast-feed --format csv > reports.csv

    # Summary statistics
    coast-feed --stats
    coast-feed --stats --period 7d --format json

OUTPUT FORMATS:
    text  - Human-readable cards (default)
    json  - JSON array
    jsonl - One JSON object per line
    csv   - CSV with headers

EXIT CODES:
    0 - Success (including empty results)
    1 - Network, server or configuration error
    3 - Invalid arguments
"#)]
struct Args {
    /// Only show reports whose type or location contains this text
    #[arg(short, long, value_name = "TERM")]
    search: Option<String>,

    /// Maximum number of reports to print
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json", "jsonl", "csv"])]
    format: String,

    /// Print summary statistics instead of the report list
    #[arg(long)]
    stats: bool,

    /// Window for --stats: 7d, 30d, 90d, 1y or all
    #[arg(long, default_value = "30d", value_name = "PERIOD", requires = "stats")]
    period: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    LoggingConfig::from_env(args.verbose).init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<CoastwatchError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(args: Args) -> Result<()> {
    tracing::debug!("coast-feed started with args: {:?}", args);

    let period: Period = args.period.parse()?;
    let config = Config::load()?;
    let service = CoastwatchService::from_config(config)?;

    service.feed().load().await?;

    let mut items = service.feed().search(args.search.as_deref().unwrap_or(""));

    if args.stats {
        let stats = Analytics::compute(&items, period, chrono::Utc::now());
        return print_stats(&stats, &args.format);
    }

    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&items)?),
        "jsonl" => {
            for item in &items {
                println!("{}", serde_json::to_string(item)?);
            }
        }
        "csv" => print_csv(&items),
        _ => print_text(&items),
    }

    Ok(())
}

fn print_text(items: &[FeedItem]) {
    if items.is_empty() {
        eprintln!("No hazard reports found");
        return;
    }

    for item in items {
        println!(
            "{} {} [{}] {} · {}",
            item.icon,
            item.type_label,
            item.severity.as_str().to_uppercase(),
            item.status.label(),
            item.relative_time
        );
        println!("  {}", item.location);
        if !item.description.is_empty() {
            let preview: String = item.description.chars().take(120).collect();
            if preview.len() < item.description.len() {
                println!("  {}...", preview);
            } else {
                println!("  {}", preview);
            }
        }
        println!("  {} · {}", item.reporter, item.id);
        println!();
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn print_csv(items: &[FeedItem]) {
    println!("id,type,severity,status,latitude,longitude,created_at,image_url,description");
    for item in items {
        println!(
            "{},{},{},{},{},{},{},{},{}",
            csv_field(&item.id),
            csv_field(&item.type_label),
            item.severity,
            csv_field(item.status.label()),
            item.coordinates.latitude,
            item.coordinates.longitude,
            item.created_at.to_rfc3339(),
            csv_field(&item.image_url),
            csv_field(&item.description)
        );
    }
}

fn print_stats(stats: &Analytics, format: &str) -> Result<()> {
    match format {
        "json" | "jsonl" => println!("{}", serde_json::to_string_pretty(stats)?),
        "csv" => {
            println!("month,reports,resolved");
            for month in &stats.monthly {
                println!("{},{},{}", month.month, month.reports, month.resolved);
            }
        }
        _ => {
            println!("Reports ({}):     {}", stats.period, stats.total);
            println!("High priority:     {}", stats.high_priority);
            println!(
                "Resolved:          {} ({}% resolution rate)",
                stats.resolved, stats.resolution_rate
            );

            if !stats.top_types.is_empty() {
                println!();
                println!("Top hazard types:");
                for entry in &stats.top_types {
                    println!("  {:<20} {:>4} ({}%)", entry.label, entry.count, entry.percent);
                }
            }

            if !stats.monthly.is_empty() {
                println!();
                println!("Monthly trend:");
                for month in &stats.monthly {
                    println!(
                        "  {:<10} {:>4} reports, {} resolved",
                        month.month, month.reports, month.resolved
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }
}
