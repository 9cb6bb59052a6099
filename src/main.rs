use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing::{error, info, warn};
use wigle_sweep::export::{import_json, to_pretty_json, ExportFormat};
use wigle_sweep::proxy::{
    CheckerConfig, CrawlerConfig, CrawlerDiscovery, ProxyChecker, ProxyCrawler, ProxyPool,
};
use wigle_sweep::wigle::{
    GeoResolver, HttpWigleApi, NetworkFetcher, NetworkRecord, Rotation, SearchQuery,
};
use wigle_sweep::{logging, Config, CredentialPool};

/// Searches WiGLE for every Wi-Fi network seen in an area, by SSID or by
/// BSSID. If no output file is given the results are printed as JSON.
#[derive(Parser, Debug)]
#[command(name = "wigle-sweep", version)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(true)
        .args(["location", "ssid", "mac", "input_json"])
))]
struct Cli {
    /// Path to config file
    #[arg(short = 'C', long, default_value = "config.json")]
    config_file: PathBuf,

    /// Location to query, e.g. "Basingstoke, Hampshire, UK"
    #[arg(short, long)]
    location: Option<String>,

    /// SSID to query
    #[arg(short, long)]
    ssid: Option<String>,

    /// BSSID (MAC address) to query
    #[arg(short, long)]
    mac: Option<String>,

    /// JSON file from a previous run to convert instead of querying
    #[arg(short, long, conflicts_with_all = ["location", "ssid", "mac"])]
    input_json: Option<PathBuf>,

    /// JSON file to write
    #[arg(short, long)]
    json_out: Option<PathBuf>,

    /// CSV file to write
    #[arg(short, long)]
    csv_out: Option<PathBuf>,

    /// KML file to write
    #[arg(short, long)]
    kml_out: Option<PathBuf>,

    /// Print JSON to stdout even when writing files
    #[arg(short, long)]
    print: bool,

    /// Log every retry, proxy and credential change
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn export_targets(&self) -> Vec<(ExportFormat, &PathBuf)> {
        [
            (ExportFormat::Json, &self.json_out),
            (ExportFormat::Csv, &self.csv_out),
            (ExportFormat::Kml, &self.kml_out),
        ]
        .into_iter()
        .filter_map(|(format, path)| path.as_ref().map(|p| (format, p)))
        .collect()
    }

    fn prints_json(&self) -> bool {
        self.print || self.export_targets().is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let records = match &cli.input_json {
        Some(path) => {
            logging::init_logging(cli.verbose);
            let records = import_json(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            info!("Loaded {} networks from {}", records.len(), path.display());
            records
        }
        None => {
            let path = &cli.config_file;
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            logging::init_logging(cli.verbose || config.debug);
            query(&cli, &config).await?
        }
    };

    let failures = export_all(&cli, &records, Local::now().date_naive());
    if failures > 0 {
        return Err(anyhow!("{} export(s) failed", failures));
    }

    Ok(())
}

/// Resolve the location if one was given, then fetch every page
async fn query(cli: &Cli, config: &Config) -> Result<Vec<NetworkRecord>> {
    let crawler_config = CrawlerConfig::new().with_timeout(config.request_timeout);
    let checker_config = CheckerConfig::new().with_timeout(config.request_timeout);
    let crawler = ProxyCrawler::with_config(crawler_config)?;
    let checker = ProxyChecker::with_config(checker_config);

    let proxies = ProxyPool::with_discovery(
        config.seed_proxies.clone(),
        Box::new(CrawlerDiscovery::new(crawler, checker)),
        config.pool.clone(),
    );
    let credentials = CredentialPool::new(config.credentials.clone());
    let mut rotation = Rotation::new(credentials, proxies);
    let api = HttpWigleApi::new(&config.api_base, config.request_timeout);

    let mut search = SearchQuery::new();
    if let Some(ssid) = &cli.ssid {
        search = search.with_ssid(ssid);
    }
    if let Some(mac) = &cli.mac {
        search = search.with_bssid(mac);
    }

    if let Some(location) = &cli.location {
        let resolved = GeoResolver::new(&api, &mut rotation, config.retry)
            .resolve_address(location)
            .await;
        match resolved {
            Ok(bbox) => search = search.with_bbox(bbox),
            Err(e) => {
                error!("Could not resolve {:?}: {}", location, e);
                return Ok(Vec::new());
            }
        }
    }

    let report = NetworkFetcher::new(&api, &mut rotation, config.retry)
        .fetch_all(&search)
        .await;

    let found = report.records.len();
    if report.is_complete() {
        info!("Found {} networks over {} pages", found, report.pages);
    } else {
        warn!(
            "Stopped after {} networks ({}), results may not be complete",
            found, report.stop
        );
    }

    Ok(report.records)
}

/// Run every requested export; one failing never stops the rest.
/// Returns the number of failures.
fn export_all(cli: &Cli, records: &[NetworkRecord], today: NaiveDate) -> usize {
    let mut failures = 0;

    for (format, path) in cli.export_targets() {
        match format.export(records, path, today) {
            Ok(()) => info!("Wrote {} networks to {}", records.len(), path.display()),
            Err(e) => {
                error!("Export to {}: {}", format, e);
                failures += 1;
            }
        }
    }

    if cli.prints_json() {
        match to_pretty_json(records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Print JSON: {}", e);
                failures += 1;
            }
        }
    }

    failures
}
