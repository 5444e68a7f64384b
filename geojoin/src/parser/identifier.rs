//! Extraction des identifiants stables des placemarks
//!
//! Ordre de résolution, pour la feature à la position *i* :
//! 1. attribut `id` du placemark à la même position
//! 2. nom affiché de la feature recherché dans l'index nom -> identifiant
//! 3. identifiant déjà présent dans les propriétés (`id`, `ID`, `Id`)
//!
//! L'identifiant résolu est écrit uniquement dans `GeoFeature::id`.

use std::collections::HashMap;

use roxmltree::Node;
use tracing::{debug, trace};

use super::child_text;
use crate::types::{GeoFeature, PlacemarkDescriptor};

/// Décrit chaque placemark (id d'élément + nom trimé), dans l'ordre du document
pub fn describe_placemarks(placemarks: &[Node]) -> Vec<PlacemarkDescriptor> {
    placemarks
        .iter()
        .map(|placemark| PlacemarkDescriptor {
            id: placemark
                .attribute("id")
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            name: child_text(*placemark, "name"),
        })
        .collect()
}

/// Index nom -> identifiant; sur collision de nom, le dernier placemark gagne
pub fn name_index(descriptors: &[PlacemarkDescriptor]) -> HashMap<&str, &str> {
    descriptors
        .iter()
        .filter_map(|d| Some((d.name.as_deref()?, d.id.as_deref()?)))
        .collect()
}

/// Résout et écrit l'identifiant de chaque feature.
///
/// `features` et `descriptors` sont alignés position par position.
pub fn assign_identifiers(features: &mut [GeoFeature], descriptors: &[PlacemarkDescriptor]) {
    let names = name_index(descriptors);

    let mut by_position = 0usize;
    let mut by_name = 0usize;
    let mut by_property = 0usize;

    for (position, feature) in features.iter_mut().enumerate() {
        if feature.id.is_none() {
            if let Some(id) = descriptors.get(position).and_then(|d| d.id.clone()) {
                feature.id = Some(id);
                by_position += 1;
            } else if let Some(id) = feature.name().and_then(|name| names.get(name)) {
                trace!(position, id = *id, "Identifier resolved by name");
                feature.id = Some((*id).to_string());
                by_name += 1;
            }
        }

        // Promotion d'un identifiant porté par les propriétés
        if feature.id.is_none() {
            if let Some(id) = feature.property_id().map(|id| id.into_owned()) {
                feature.id = Some(id);
                by_property += 1;
            }
        }
    }

    debug!(
        features = features.len(),
        by_position, by_name, by_property, "Identifiers assigned"
    );
}
