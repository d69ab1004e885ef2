use chrono::{Local, Utc};
use clap::Parser;
use colored::*;
use std::cmp::Ordering;

use cctally::aggregate::summarize;
use cctally::error::{Result, TallyError};
use cctally::formatting::{format_compact, format_currency, format_number_with_commas};
use cctally::loader::load_usage_records;
use cctally::pricing::PricingTable;
use cctally::series::{TimeBucket, daily_series, hourly_series};
use cctally::store::{EventFilter, EventStore, Snapshot};
use cctally::types::{Cost, Summary};
use cctally::utils::usage_data_paths;

/// Token usage and cost report for local Claude CLI session logs
#[derive(Parser, Debug)]
#[command(name = "cctally", version, about)]
struct Args {
    /// Show only today's usage (local time)
    #[arg(long)]
    today: bool,

    /// Show usage for a specific session id
    #[arg(long)]
    session: Option<String>,

    /// Show usage for a specific project
    #[arg(long)]
    project: Option<String>,

    /// Append an hourly trend over the last N hours
    #[arg(long, conflicts_with = "days")]
    hours: Option<i64>,

    /// Append a daily trend over the last N days
    #[arg(long)]
    days: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configure rayon thread pool for optimal performance
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .thread_name(|i| format!("cctally-worker-{}", i))
        .build_global()?;

    let data_paths = usage_data_paths();
    if data_paths.is_empty() {
        eprintln!("{} no usage data directory found", "error:".red());
        return Err(TallyError::DataPathNotFound);
    }

    let records = load_usage_records(&data_paths).await?;

    let store = EventStore::new(PricingTable::default());
    let report = store.reload(records);

    if report.rejected() > 0 {
        eprintln!(
            "{} skipped {} malformed records",
            "warning:".yellow(),
            report.rejected()
        );
    }
    if report.unpriced > 0 {
        eprintln!(
            "{} {} events had no pricing entry; their tokens are counted, their cost is not",
            "warning:".yellow(),
            report.unpriced
        );
    }

    let snapshot = store.snapshot();

    let mut filter = EventFilter::new();
    let mut title = "All Time Usage Summary".to_string();
    if args.today {
        filter = filter.today();
        title = "Today's Usage Summary".to_string();
    }
    if let Some(session) = &args.session {
        filter = filter.session(session.as_str());
        title = format!("Session {} Usage Summary", session);
    }
    if let Some(project) = &args.project {
        filter = filter.project(project.as_str());
        title = format!("Project '{}' Usage Summary", project);
    }

    let summary = summarize(snapshot.select(&filter));
    print_summary(&title, &summary);

    let now = Utc::now();
    if let Some(hours) = args.hours {
        let buckets = hourly_series(snapshot.select(&filter), now, hours)?;
        print_series(&format!("Last {}h by Hour", hours), "%H:00", &buckets);
    } else if let Some(days) = args.days {
        let buckets = daily_series(snapshot.select(&filter), now, days)?;
        print_series(&format!("Last {}d by Day", days), "%Y-%m-%d", &buckets);
    } else if args.session.is_none() && args.project.is_none() && !args.today {
        print_recent(&snapshot);
    }

    Ok(())
}

fn print_summary(title: &str, summary: &Summary) {
    println!("\n{}", title.bold());
    println!("{}", "=".repeat(60));

    if summary.is_empty() {
        println!("No usage data found.");
        return;
    }

    println!(
        "Requests: {}   Sessions: {}   Projects: {}",
        format_number_with_commas(summary.event_count as u64),
        summary.session_count,
        summary.project_count
    );
    println!(
        "Input: {}   Output: {}",
        format_number_with_commas(summary.tokens.input),
        format_number_with_commas(summary.tokens.output)
    );
    println!(
        "Cache: {} writes, {} reads",
        format_number_with_commas(summary.tokens.cache_creation),
        format_number_with_commas(summary.tokens.cache_read)
    );
    println!(
        "Total Tokens: {}",
        format_number_with_commas(summary.tokens.total())
    );
    println!(
        "Total Cost: {}",
        Cost::new(summary.total_cost).to_formatted_string().green()
    );
    if Cost::new(summary.cache_savings).is_positive() {
        println!(
            "Cache Savings: {}",
            Cost::new(summary.cache_savings)
                .to_formatted_string()
                .cyan()
        );
    }
    if summary.unpriced_count > 0 {
        println!(
            "{}",
            format!("({} events excluded from cost totals)", summary.unpriced_count).yellow()
        );
    }

    println!("\n{}", "Model Breakdown".bold());
    println!("{}", "-".repeat(60));
    let mut models: Vec<_> = summary.by_model.iter().collect();
    models.sort_by(|a, b| b.1.cost.partial_cmp(&a.1.cost).unwrap_or(Ordering::Equal));
    for (model, usage) in models {
        println!("{}", model.cyan());
        println!(
            "   Requests: {}   Tokens: {} (in: {}, out: {})",
            usage.requests,
            format_number_with_commas(usage.tokens.total()),
            format_number_with_commas(usage.tokens.input),
            format_number_with_commas(usage.tokens.output)
        );
        println!("   Cost: {}", format_currency(usage.cost));
    }
}

fn print_recent(snapshot: &Snapshot) {
    if snapshot.is_empty() {
        return;
    }

    println!("\n{}", "Recent Activity".bold());
    println!("{}", "-".repeat(60));
    for priced in snapshot.recent(5) {
        let timestamp = priced
            .event
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let model = truncate(&priced.event.model, 24);
        let cost = priced
            .cost
            .map(|b| format_currency(b.total()))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{} | {:<24} | {:>10} tokens | {}",
            timestamp,
            model,
            format_number_with_commas(priced.event.tokens.total()),
            cost
        );
    }
}

fn print_series(title: &str, label_format: &str, buckets: &[TimeBucket]) {
    println!("\n{}", title.bold());
    println!("{}", "-".repeat(60));
    for bucket in buckets {
        let label = bucket
            .start
            .with_timezone(&Local)
            .format(label_format)
            .to_string();
        let summary = &bucket.summary;
        println!(
            "{:>10}  {:>8} tokens  {:>4} requests  {}",
            label,
            format_compact(summary.tokens.total() as f64),
            summary.event_count,
            format_currency(summary.total_cost)
        );
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
