//! Export de la carte choroplèthe en GeoJSON (simplestyle + popup)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{feature, Feature, FeatureCollection, JsonObject, JsonValue};
use serde_json::Number;

use geojoin::{join, GeoCollection, GeoFeature, Presenter, Primitive};

/// Construit la FeatureCollection stylée
pub fn to_feature_collection(
    collection: &GeoCollection,
    presenter: &Presenter,
) -> Result<FeatureCollection> {
    let features = collection
        .iter()
        .enumerate()
        .map(|(position, feature)| {
            to_feature(feature, presenter)
                .with_context(|| format!("Failed to build feature #{}", position))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Écrit la FeatureCollection dans un fichier
pub fn export_to_geojson(
    collection: &GeoCollection,
    presenter: &Presenter,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, &to_feature_collection(collection, presenter)?)
        .context("Failed to serialize GeoJSON")?;
    writer.flush()?;

    Ok(())
}

/// Feature GeoJSON : géométrie, propriétés d'origine, style et popup
fn to_feature(source: &GeoFeature, presenter: &Presenter) -> Result<Feature> {
    let presentation = presenter.present(source);
    let style = presentation.style;

    let mut properties: JsonObject = source
        .properties
        .iter()
        .map(|(key, value)| (key.clone(), primitive_to_json(value)))
        .collect();

    properties.insert("stroke".into(), style.stroke_color.to_hex().into());
    properties.insert("fill".into(), style.fill_color.to_hex().into());
    properties.insert("stroke-width".into(), number(style.stroke_weight));
    properties.insert("stroke-opacity".into(), number(style.stroke_opacity));
    properties.insert("fill-opacity".into(), number(style.fill_opacity));
    let popup = serde_json::to_value(&presentation.popup).context("Failed to serialize popup")?;
    properties.insert("popup".into(), popup);
    properties.insert("popupHtml".into(), presentation.popup.to_html().into());

    Ok(Feature {
        bbox: None,
        geometry: source
            .geometry
            .as_ref()
            .map(|geom| geojson::Geometry::new(geojson::Value::from(geom))),
        id: join::resolve_identifier(source).map(|id| feature::Id::String(id.into_owned())),
        properties: Some(properties),
        foreign_members: None,
    })
}

fn primitive_to_json(value: &Primitive) -> JsonValue {
    match value {
        Primitive::Bool(b) => JsonValue::Bool(*b),
        Primitive::Number(n) => number(*n),
        Primitive::String(s) => JsonValue::String(s.clone()),
    }
}

/// Nombre JSON; `null` si non fini
fn number(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}
