//! Point d'entrée CLI pour choropleth

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Colorer des zones KML selon les métriques d'une table CSV
#[derive(Parser)]
#[command(name = "choropleth")]
#[command(author, version)]
#[command(about = "Colorer des zones KML selon les métriques d'une table CSV")]
#[command(long_about = "Joint les placemarks d'un document KML aux lignes d'une table CSV (id, revenue, cost) et produit une carte choroplèthe GeoJSON.\n\nLa métrique vient de --metric, sinon de CHOROPLETH_METRIC, sinon de la configuration, sinon revenue.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Render {
            kml,
            csv,
            output,
            metric,
            config,
            report,
        } => {
            info!(kml = %kml.display(), csv = %csv.display(), output = %output.display(), "Render choropleth");
            cli::cmd_render(&kml, &csv, &output, metric.as_deref(), &config, report.as_deref())?;
        }
        Commands::Report {
            kml,
            csv,
            metric,
            config,
            json,
        } => {
            info!(kml = %kml.display(), csv = %csv.display(), "Join report");
            cli::cmd_report(&kml, &csv, metric.as_deref(), &config, json.as_deref())?;
        }
        Commands::Range {
            csv,
            metric,
            config,
            steps,
        } => {
            info!(csv = %csv.display(), steps, "Metric range");
            cli::cmd_range(&csv, metric.as_deref(), &config, steps)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
