use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use geobatch::api::DataflowClient;
use geobatch::batch::{BingBatchForward, adapt_results_bytes, generate_batch, ordered_results};
use geobatch::config::FileConfig;
use geobatch::domain::BatchForwardResult;

/// Geocode a list of addresses with one Bing Spatial Data Services batch job
///
/// Examples:
///   # Geocode two addresses
///   geobatch -k $KEY -a "Denver,CO" -a "Boulder,CO"
///
///   # One address per line, results written as CSV
///   geobatch -i addresses.txt -o results.csv
///
///   # Inspect the upload document without contacting the service
///   geobatch -i addresses.txt --dry-run
///
///   # Decode a result file downloaded earlier
///   geobatch -i addresses.txt --response succeeded.csv
#[derive(Parser, Debug)]
#[command(name = "geobatch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches geobatch.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to geocode (repeatable)
    #[arg(short = 'a', long = "address")]
    addresses: Vec<String>,

    /// File with one address per line
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Bing Maps key
    #[arg(short = 'k', long, env = "BING_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Write results as CSV to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print the batch upload document and exit
    #[arg(long)]
    dry_run: bool,

    /// Decode a previously downloaded result document instead of submitting
    #[arg(long, conflicts_with = "dry_run")]
    response: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    id: usize,
    query: &'a str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    ok: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = match args.config {
        Some(ref config_path) => Some(FileConfig::from_path(config_path)?),
        None => FileConfig::load(),
    };

    let verbose = args.verbose || file_config.as_ref().map(|c| c.verbose).unwrap_or(false);
    let input = args
        .input
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.input.clone()));
    let output = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()));
    let key = args
        .key
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.key.clone()));
    let dataflow_config = file_config
        .as_ref()
        .and_then(|c| c.dataflow.clone())
        .unwrap_or_default();

    let addresses = if !args.addresses.is_empty() {
        args.addresses.clone()
    } else if let Some(ref path) = input {
        read_addresses(path)?
    } else {
        bail!("Must provide addresses with --address/-a or --input/-i");
    };

    if args.dry_run {
        let payload = generate_batch(&addresses).context("Failed to encode batch request")?;
        print!("{}", payload);
        return Ok(());
    }

    if verbose {
        println!("Configuration:");
        println!("  Addresses: {}", addresses.len());
        println!("  Dataflow URL: {}", dataflow_config.url);
        println!(
            "  Poll: every {}s, timeout {}s",
            dataflow_config.poll_interval_secs, dataflow_config.timeout_secs
        );
        if let Some(ref o) = output {
            println!("  Output: {}", o.display());
        }
        println!();
    }

    let results = if let Some(ref path) = args.response {
        let body = std::fs::read(path)
            .context(format!("Failed to read response file: {:?}", path))?;
        let rows = adapt_results_bytes(body).context("Failed to decode batch results")?;
        if verbose {
            println!("  Decoded {} result rows from {}", rows.len(), path.display());
        }
        ordered_results(rows, addresses.len())
    } else {
        let Some(key) = key else {
            bail!("A Bing Maps key is required: use --key/-k, BING_API_KEY or the config file");
        };
        let client = DataflowClient::new(key, dataflow_config)?;
        let spinner = create_spinner(&format!("Geocoding {} addresses...", addresses.len()));
        let start = Instant::now();
        let results = client
            .geocode(&BingBatchForward, &addresses)
            .context("Batch geocoding failed")?;
        spinner.finish_with_message(format!(
            "Geocoded {} of {} addresses [{:.1}s]",
            results.iter().filter(|r| r.ok()).count(),
            addresses.len(),
            start.elapsed().as_secs_f32()
        ));
        results
    };

    let records = build_records(&addresses, &results)?;
    print_results(&records);

    if let Some(ref path) = output {
        write_records(path, &records)?;
        println!();
        println!("Output: {}", path.display());
    }

    if verbose {
        for result in results.iter().filter(|r| !r.ok()) {
            result.debug(true);
        }
        println!(
            "Done! Total time: {:.1}s",
            total_start.elapsed().as_secs_f32()
        );
    }

    Ok(())
}

fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .context(format!("Failed to read address file: {:?}", path))?;
    Ok(contents.lines().map(str::to_string).collect())
}

fn build_records<'a>(
    addresses: &'a [String],
    results: &[BatchForwardResult],
) -> Result<Vec<OutputRecord<'a>>> {
    addresses
        .iter()
        .zip(results)
        .enumerate()
        .map(|(id, (query, result))| -> Result<OutputRecord<'a>> {
            let point = result
                .point()
                .context(format!("Bad coordinates for row {} ({})", id, query))?;
            Ok(OutputRecord {
                id,
                query,
                latitude: point.map(|p| p.0),
                longitude: point.map(|p| p.1),
                ok: result.ok(),
            })
        })
        .collect()
}

fn print_results(records: &[OutputRecord]) {
    println!();
    for r in records {
        match (r.latitude, r.longitude) {
            (Some(lat), Some(lng)) => {
                println!("{:>4}  {:<40} ({:.6}, {:.6})", r.id, r.query, lat, lng)
            }
            _ => println!("{:>4}  {:<40} no result", r.id, r.query),
        }
    }
}

fn write_records(path: &Path, records: &[OutputRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .context(format!("Failed to create output file: {:?}", path))?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
