//! Conversion des styles KML en propriétés simplestyle

use std::collections::HashMap;

use roxmltree::Node;

use super::{child_element, child_text};
use crate::types::{Primitive, Properties};

/// Propriétés de style d'un placemark (clés simplestyle)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleProperties {
    pub stroke: Option<String>,
    pub stroke_opacity: Option<f64>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
    pub fill_opacity: Option<f64>,
}

impl StyleProperties {
    /// Superpose `other` sur `self` (les valeurs définies de `other` gagnent)
    pub fn merged_with(mut self, other: &StyleProperties) -> Self {
        if other.stroke.is_some() {
            self.stroke = other.stroke.clone();
        }
        self.stroke_opacity = other.stroke_opacity.or(self.stroke_opacity);
        self.stroke_width = other.stroke_width.or(self.stroke_width);
        if other.fill.is_some() {
            self.fill = other.fill.clone();
        }
        self.fill_opacity = other.fill_opacity.or(self.fill_opacity);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Écrit les clés simplestyle dans le sac de propriétés
    pub fn apply(&self, properties: &mut Properties) {
        if let Some(ref stroke) = self.stroke {
            properties.insert("stroke".to_string(), Primitive::from(stroke.as_str()));
        }
        if let Some(opacity) = self.stroke_opacity {
            properties.insert("stroke-opacity".to_string(), Primitive::Number(opacity));
        }
        if let Some(width) = self.stroke_width {
            properties.insert("stroke-width".to_string(), Primitive::Number(width));
        }
        if let Some(ref fill) = self.fill {
            properties.insert("fill".to_string(), Primitive::from(fill.as_str()));
        }
        if let Some(opacity) = self.fill_opacity {
            properties.insert("fill-opacity".to_string(), Primitive::Number(opacity));
        }
    }
}

/// Styles partagés du document, indexés par `#id`
#[derive(Debug, Default)]
pub struct SharedStyles {
    styles: HashMap<String, StyleProperties>,
}

impl SharedStyles {
    /// Collecte les `Style` et `StyleMap` identifiés du document
    pub fn collect(root: Node) -> Self {
        let mut styles = HashMap::new();

        for node in root.descendants().filter(|n| n.has_tag_name("Style")) {
            if let Some(id) = node.attribute("id") {
                styles.insert(format!("#{id}"), from_style_node(node));
            }
        }

        // StyleMap: on retient la paire "normal"
        let mut aliases = Vec::new();
        for node in root.descendants().filter(|n| n.has_tag_name("StyleMap")) {
            let Some(id) = node.attribute("id") else {
                continue;
            };
            let normal = node
                .children()
                .filter(|n| n.has_tag_name("Pair"))
                .find(|pair| child_text(*pair, "key").as_deref() == Some("normal"));
            let Some(pair) = normal else {
                continue;
            };

            if let Some(url) = child_text(pair, "styleUrl") {
                aliases.push((format!("#{id}"), url));
            } else if let Some(inline) = child_element(pair, "Style") {
                styles.insert(format!("#{id}"), from_style_node(inline));
            }
        }

        for (alias, target) in aliases {
            if let Some(style) = styles.get(&target).cloned() {
                styles.insert(alias, style);
            }
        }

        Self { styles }
    }

    /// Style effectif d'un placemark : style partagé puis style inline
    pub fn resolve(&self, placemark: Node) -> StyleProperties {
        let shared = child_text(placemark, "styleUrl")
            .and_then(|url| self.styles.get(&local_url(&url)).cloned())
            .unwrap_or_default();

        match child_element(placemark, "Style") {
            Some(inline) => shared.merged_with(&from_style_node(inline)),
            None => shared,
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Réduit une URL de style à sa partie `#fragment`
fn local_url(url: &str) -> String {
    match url.rfind('#') {
        Some(pos) => url[pos..].to_string(),
        None => format!("#{url}"),
    }
}

/// Convertit un élément `Style` (LineStyle + PolyStyle)
pub fn from_style_node(style: Node) -> StyleProperties {
    let mut props = StyleProperties::default();

    if let Some(line) = child_element(style, "LineStyle") {
        if let Some((hex, opacity)) = child_text(line, "color").and_then(|c| parse_kml_color(&c)) {
            props.stroke = Some(hex);
            props.stroke_opacity = Some(opacity);
        }
        props.stroke_width = child_text(line, "width").and_then(|w| fast_float::parse(w.trim()).ok());
    }

    if let Some(poly) = child_element(style, "PolyStyle") {
        if let Some((hex, opacity)) = child_text(poly, "color").and_then(|c| parse_kml_color(&c)) {
            props.fill = Some(hex);
            props.fill_opacity = Some(opacity);
        }
        if child_text(poly, "fill").as_deref() == Some("0") {
            props.fill_opacity = Some(0.0);
        }
        if child_text(poly, "outline").as_deref() == Some("0") {
            props.stroke_opacity = Some(0.0);
        }
    }

    props
}

/// Convertit une couleur KML `aabbggrr` en (`#rrggbb`, opacité)
pub fn parse_kml_color(value: &str) -> Option<(String, f64)> {
    let value = value.trim().trim_start_matches('#');
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let alpha = u8::from_str_radix(&value[0..2], 16).ok()?;
    let blue = &value[2..4];
    let green = &value[4..6];
    let red = &value[6..8];

    let hex = format!("#{red}{green}{blue}").to_ascii_lowercase();
    let opacity = (f64::from(alpha) / 255.0 * 100.0).round() / 100.0;
    Some((hex, opacity))
}
