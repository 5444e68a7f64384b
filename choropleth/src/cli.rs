//! Définition et implémentation des commandes CLI
//!
//! - `render`: KML + CSV → GeoJSON stylé
//! - `report`: bilan de jointure
//! - `range`: plage et légende d'une métrique

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use geojoin::{ColorScale, Metric, RecordIndex};
use tracing::{debug, info, warn};

use choropleth::config::{Config, METRIC_ENV};
use choropleth::export::export_to_geojson;
use choropleth::{AppState, JoinReport};

#[derive(Subcommand)]
pub enum Commands {
    /// Render a choropleth GeoJSON from a KML document and a CSV table
    Render {
        /// Path to the KML document
        #[arg(short, long)]
        kml: PathBuf,

        /// Path to the CSV table (columns id, revenue, cost)
        #[arg(short, long)]
        csv: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Metric driving the colors: revenue or cost (défaut : env CHOROPLETH_METRIC / config)
        #[arg(short, long)]
        metric: Option<String>,

        /// Config preset name (default/outline/bold) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Save the join report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the join report (unmatched features, unused ids, duplicates)
    Report {
        /// Path to the KML document
        #[arg(short, long)]
        kml: PathBuf,

        /// Path to the CSV table
        #[arg(short, long)]
        csv: PathBuf,

        /// Metric used for the range: revenue or cost
        #[arg(short, long)]
        metric: Option<String>,

        /// Config preset name or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Also save the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the range of a metric and its color legend
    Range {
        /// Path to the CSV table
        #[arg(short, long)]
        csv: PathBuf,

        /// Metric: revenue or cost
        #[arg(short, long)]
        metric: Option<String>,

        /// Config preset name or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Number of legend stops
        #[arg(long, default_value_t = 5)]
        steps: usize,
    },
}

/// Exécute la commande render
pub fn cmd_render(
    kml: &Path,
    csv: &Path,
    output: &Path,
    metric: Option<&str>,
    config_spec: &str,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = Config::from_spec(config_spec)?;
    let metric = resolve_metric(&config, metric)?;

    let state = load_state(kml, csv, metric)?;
    let snapshot = state.snapshot();

    let empty = RecordIndex::default();
    let presenter = snapshot.presenter(&empty, config.style);
    let geo = snapshot
        .geo
        .as_ref()
        .context("No KML dataset loaded")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    export_to_geojson(&geo.data, &presenter, output)?;
    info!(output = %output.display(), features = geo.data.len(), "GeoJSON written");

    let report = build_report(&state)?;
    if report.matched < report.features {
        warn!(
            unmatched = report.features - report.matched,
            "Some features have no row in the table"
        );
    }

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        info!(path = %path.display(), "Join report saved");
    }

    println!(
        "Render complete: {} -> {} ({})",
        kml.display(),
        output.display(),
        report.summary()
    );

    Ok(())
}

/// Exécute la commande report
pub fn cmd_report(
    kml: &Path,
    csv: &Path,
    metric: Option<&str>,
    config_spec: &str,
    json: Option<&Path>,
) -> Result<()> {
    let config = Config::from_spec(config_spec)?;
    let metric = resolve_metric(&config, metric)?;

    let state = load_state(kml, csv, metric)?;
    let report = build_report(&state)?;
    report.display();

    if let Some(path) = json {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
    }

    Ok(())
}

/// Exécute la commande range
pub fn cmd_range(csv: &Path, metric: Option<&str>, config_spec: &str, steps: usize) -> Result<()> {
    let config = Config::from_spec(config_spec)?;
    let metric = resolve_metric(&config, metric)?;

    let mut state = AppState::new();
    let table = state
        .load_table(&read_upload(csv)?)
        .with_context(|| format!("Failed to parse {}", csv.display()))?;

    let scale = ColorScale::new(table.index.records(), metric);
    match scale.range() {
        Some(range) => {
            println!("{}: {} .. {}", metric, range.min, range.max);
            for stop in scale.legend(steps) {
                println!("  {:>14} {}", stop.value, stop.color);
            }
        }
        None => println!("{}: no finite value", metric),
    }

    Ok(())
}

/// Charge les deux jeux de données puis sélectionne la métrique
fn load_state(kml: &Path, csv: &Path, metric: Metric) -> Result<AppState> {
    let mut state = AppState::new();

    state
        .load_geo(&read_upload(kml)?)
        .with_context(|| format!("Failed to parse {}", kml.display()))?;
    state
        .load_table(&read_upload(csv)?)
        .with_context(|| format!("Failed to parse {}", csv.display()))?;

    // Le chargement de la table remet la métrique à revenue
    state.select_metric(metric);

    Ok(state)
}

fn build_report(state: &AppState) -> Result<JoinReport> {
    let geo = state.geo().context("No KML dataset loaded")?;
    let table = state.table().context("No CSV dataset loaded")?;

    Ok(JoinReport::new(&geo.data, &table.data, state.metric())
        .with_fingerprints(&geo.fingerprint, &table.fingerprint))
}

/// Lit un fichier d'entrée en entier
fn read_upload(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot open {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Input read");
    Ok(bytes)
}

fn resolve_metric(config: &Config, flag: Option<&str>) -> Result<Metric> {
    let env = std::env::var(METRIC_ENV).ok();
    config.resolve_metric(flag, env.as_deref())
}
