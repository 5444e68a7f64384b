//! Configuration du rendu

use std::path::Path;

use anyhow::{Context, Result};
use geojoin::{Metric, StyleDefaults};
use serde::{Deserialize, Serialize};

/// Noms des presets embarqués
pub const PRESETS: &[&str] = &["default", "outline", "bold"];

/// Variable d'environnement fournissant la métrique par défaut
pub const METRIC_ENV: &str = "CHOROPLETH_METRIC";

/// Configuration principale
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Épaisseur et opacités appliquées quand la feature n'en porte pas
    pub style: StyleDefaults,

    /// Métrique utilisée si ni `--metric` ni `CHOROPLETH_METRIC` ne sont fournis
    pub default_metric: Option<Metric>,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "outline" => Self::load_embedded(include_str!("presets/outline.json")),
            "bold" => Self::load_embedded(include_str!("presets/bold.json")),
            _ => anyhow::bail!(
                "Unknown preset: {}. Use: {}",
                preset,
                PRESETS.join(", ")
            ),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn from_spec(spec: &str) -> Result<Self> {
        if PRESETS.contains(&spec) {
            Self::from_preset(spec)
        } else {
            Self::load(Path::new(spec))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Métrique effective : flag > env > config > revenue
    pub fn resolve_metric(&self, flag: Option<&str>, env: Option<&str>) -> Result<Metric> {
        if let Some(name) = flag {
            return name.parse().context("Invalid --metric value");
        }
        if let Some(name) = env.filter(|v| !v.trim().is_empty()) {
            return name
                .trim()
                .parse()
                .context(format!("Invalid {} value", METRIC_ENV));
        }
        Ok(self.default_metric.unwrap_or_default())
    }
}
