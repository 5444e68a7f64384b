//! Parser pour les documents KML

use roxmltree::{Document, Node};
use tracing::debug;

use super::style::SharedStyles;
use super::{child_element, child_text, geometry, identifier, text_content};
use crate::types::{GeoCollection, GeoFeature, Primitive, Properties};
use crate::ParseError;

/// Éléments racine acceptés
const ROOT_ELEMENTS: &[&str] = &["kml", "Document", "Folder", "Placemark"];

/// Parse un document KML en collection de features identifiées.
///
/// Une feature est produite pour chaque `Placemark`, quelle que soit sa
/// profondeur (Document, Folder imbriqués), dans l'ordre du document.
///
/// # Errors
///
/// - `ParseError::Malformed` si le XML est invalide ou la racine inattendue
/// - `ParseError::EmptyDocument` si le document ne contient aucun placemark
pub fn parse(content: &str) -> Result<GeoCollection, ParseError> {
    let doc = Document::parse(content).map_err(|e| ParseError::malformed(e.to_string()))?;

    let root = doc.root_element();
    let root_name = root.tag_name().name();
    if !ROOT_ELEMENTS.contains(&root_name) {
        return Err(ParseError::malformed(format!(
            "Expected a KML root element, found '{}'",
            root_name
        )));
    }

    let placemarks: Vec<Node> = root
        .descendants()
        .filter(|n| n.has_tag_name("Placemark"))
        .collect();

    if placemarks.is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let styles = SharedStyles::collect(root);
    let descriptors = identifier::describe_placemarks(&placemarks);

    let mut features: Vec<GeoFeature> = placemarks
        .iter()
        .map(|placemark| build_feature(*placemark, &styles))
        .collect();

    identifier::assign_identifiers(&mut features, &descriptors);

    debug!(
        placemarks = placemarks.len(),
        shared_styles = styles.len(),
        with_geometry = features.iter().filter(|f| f.geometry.is_some()).count(),
        "KML document parsed"
    );

    Ok(GeoCollection::new(features))
}

/// Construit la feature d'un placemark (géométrie + propriétés)
fn build_feature(placemark: Node, styles: &SharedStyles) -> GeoFeature {
    let mut properties = Properties::new();

    // Le style vient en premier : ExtendedData peut le surcharger
    styles.resolve(placemark).apply(&mut properties);

    for key in ["name", "description", "styleUrl"] {
        if let Some(value) = child_text(placemark, key) {
            properties.insert(key.to_string(), Primitive::String(value));
        }
    }

    if let Some(visibility) = child_text(placemark, "visibility") {
        let visible = !matches!(visibility.as_str(), "0" | "false");
        properties.insert("visibility".to_string(), Primitive::Bool(visible));
    }

    if let Some(extended) = child_element(placemark, "ExtendedData") {
        read_extended_data(extended, &mut properties);
    }

    GeoFeature {
        id: None,
        geometry: geometry::from_placemark(placemark),
        properties,
    }
}

/// Lit `Data/value` et `SchemaData/SimpleData` (valeurs gardées en texte)
fn read_extended_data(extended: Node, properties: &mut Properties) {
    for node in extended.descendants().filter(Node::is_element) {
        let Some(name) = node.attribute("name") else {
            continue;
        };

        let value = match node.tag_name().name() {
            "Data" => child_element(node, "value").map(|v| text_content(v).trim().to_string()),
            "SimpleData" => Some(text_content(node).trim().to_string()),
            _ => None,
        };

        if let Some(value) = value {
            properties.insert(name.to_string(), Primitive::String(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>North</name>
      <Point><coordinates>2.0,49.0</coordinates></Point>
    </Placemark>
    <Folder>
      <Placemark id="S2">
        <name> South </name>
        <Point><coordinates>2.0,43.0</coordinates></Point>
      </Placemark>
    </Folder>
    <Placemark id="S1">
      <name>North</name>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn test_parse_scenario() {
        let collection = parse(SCENARIO).unwrap();
        assert_eq!(collection.len(), 3);

        let ids: Vec<_> = collection.iter().map(|f| f.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("S1"), Some("S2"), Some("S1")]);

        assert_eq!(collection.features[1].name(), Some("South"));
        assert!(collection.features[2].geometry.is_none());
    }

    #[test]
    fn test_empty_document() {
        let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><name>Empty</name></Document></kml>"#;
        assert_eq!(parse(xml).unwrap_err(), ParseError::EmptyDocument);
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse("<kml><Document><Placemark></Document></kml>");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_unexpected_root() {
        let result = parse("<svg><Placemark/></svg>");
        match result {
            Err(ParseError::Malformed(msg)) => assert!(msg.contains("svg")),
            other => panic!("Expected Malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_extended_data_and_promotion() {
        let xml = r##"<kml><Document>
            <Placemark>
              <name>Zone</name>
              <visibility>0</visibility>
              <ExtendedData>
                <Data name="ID"><value> 0042 </value></Data>
                <SchemaData schemaUrl="#s"><SimpleData name="region">Alps</SimpleData></SchemaData>
              </ExtendedData>
            </Placemark>
        </Document></kml>"##;
        let collection = parse(xml).unwrap();
        let feature = &collection.features[0];

        // Les valeurs ExtendedData restent du texte (zéros initiaux conservés)
        assert_eq!(feature.id.as_deref(), Some("0042"));
        assert_eq!(feature.properties.get("region"), Some(&Primitive::from("Alps")));
        assert_eq!(feature.properties.get("visibility"), Some(&Primitive::Bool(false)));
    }

    #[test]
    fn test_inline_style_to_properties() {
        let xml = r#"<kml><Placemark id="p">
            <Style><LineStyle><color>ff0000ff</color><width>5</width></LineStyle></Style>
            <LineString><coordinates>0,0 1,1</coordinates></LineString>
        </Placemark></kml>"#;
        let collection = parse(xml).unwrap();
        let props = &collection.features[0].properties;

        assert_eq!(props.get("stroke"), Some(&Primitive::from("#ff0000")));
        assert_eq!(props.get("stroke-width"), Some(&Primitive::Number(5.0)));
    }

    #[test]
    fn test_empty_id_attribute_ignored() {
        let xml = r#"<kml><Placemark id=""><name>A</name></Placemark><Placemark id="x"><name>A</name></Placemark></kml>"#;
        let collection = parse(xml).unwrap();
        assert_eq!(collection.features[0].id.as_deref(), Some("x"));
    }
}
