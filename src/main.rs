use clap::Parser;
use geofix::config::{DeviceFix, GeoConfig};
use geofix::location::{AccuracyStats, LocationOptions, LocationRecord, LocationService};
use geofix::logging::init_logging;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// geofix: where is this machine?
///
/// Combines a device position (if known) with IP geolocation providers and
/// prints the best answer as JSON.
///
/// Examples:
///   geofix
///   geofix --lat 59.3293 --lon 18.0686 --accuracy 15
///   geofix --lat 59.3293 --lon 18.0686 --no-ip-fallback
///   geofix --serve --port 8080
#[derive(Parser)]
#[command(name = "geofix", version, about, long_about = None)]
struct Cli {
    /// Device latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Device longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Device accuracy radius in meters.
    #[arg(long, default_value_t = 10.0)]
    accuracy: f64,

    /// Do not consult IP geolocation providers.
    #[arg(long)]
    no_ip_fallback: bool,

    /// Device positioning timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Oldest acceptable platform-cached fix in milliseconds.
    #[arg(long, default_value_t = 0)]
    max_age_ms: u64,

    /// Ask the device for a coarse fix only.
    #[arg(long)]
    low_accuracy: bool,

    /// Config file (default: ~/.config/geofix/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print accuracy diagnostics.
    #[arg(long)]
    stats: bool,

    /// Run the HTTP server instead of a one-shot lookup.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// JSON written to stdout.
#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    location: &'a LocationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<AccuracyStats>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Configuration ───────────────────────────────────────────

    let loaded = match &cli.config {
        Some(path) => GeoConfig::load_from(path),
        None => GeoConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if let (Some(latitude), Some(longitude)) = (cli.lat, cli.lon) {
        config.device = Some(DeviceFix {
            latitude,
            longitude,
            accuracy_meters: cli.accuracy,
        });
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(cli.verbose, &config.log_level);

    let service = Arc::new(LocationService::from_config(&config));

    // ── Server mode ─────────────────────────────────────────────

    if cli.serve {
        if let Err(e) = geofix::server::start(service, &cli.host, cli.port).await {
            eprintln!("Error: server on {}:{}: {}", cli.host, cli.port, e);
            std::process::exit(1);
        }
        return;
    }

    // ── One-shot lookup ─────────────────────────────────────────

    let options = LocationOptions {
        enable_high_accuracy: !cli.low_accuracy,
        timeout_millis: cli.timeout_ms,
        max_cached_age_millis: cli.max_age_ms,
        fallback_to_ip: !cli.no_ip_fallback,
    };

    let record = service.get_location(&options).await;
    eprintln!("  {}", record.display_line());

    let report = Report {
        location: &record,
        stats: cli.stats.then(|| service.accuracy_stats()),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot serialize result: {}", e);
            std::process::exit(1);
        }
    }
}
