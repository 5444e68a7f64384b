//! Construction des géométries depuis les éléments KML

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use roxmltree::Node;
use tracing::warn;

use super::{child_element, text_content};

/// Éléments géométriques KML reconnus
const GEOMETRY_TAGS: &[&str] = &["Point", "LineString", "LinearRing", "Polygon", "MultiGeometry"];

/// Géométrie d'un placemark (premier élément géométrique enfant)
pub fn from_placemark(placemark: Node) -> Option<Geometry> {
    placemark
        .children()
        .filter(Node::is_element)
        .find(|n| GEOMETRY_TAGS.contains(&n.tag_name().name()))
        .and_then(parse_geometry)
}

/// Parse un élément géométrique
fn parse_geometry(node: Node) -> Option<Geometry> {
    match node.tag_name().name() {
        "Point" => parse_point(node).map(Geometry::Point),
        "LineString" | "LinearRing" => parse_linestring(node).map(Geometry::LineString),
        "Polygon" => parse_polygon(node).map(Geometry::Polygon),
        "MultiGeometry" => parse_multi_geometry(node),
        _ => None,
    }
}

fn parse_point(node: Node) -> Option<Point> {
    coordinates_of(node).first().map(|&c| Point::from(c))
}

fn parse_linestring(node: Node) -> Option<LineString> {
    let coords = coordinates_of(node);
    if coords.len() < 2 {
        return None;
    }
    Some(LineString::new(coords))
}

/// Ring d'un `outerBoundaryIs` / `innerBoundaryIs`
fn parse_ring(boundary: Node) -> Option<LineString> {
    let ring = child_element(boundary, "LinearRing")?;
    let coords = coordinates_of(ring);
    if coords.len() < 3 {
        return None;
    }
    Some(LineString::new(coords))
}

fn parse_polygon(node: Node) -> Option<Polygon> {
    let exterior = child_element(node, "outerBoundaryIs").and_then(parse_ring)?;

    let interiors = node
        .children()
        .filter(|n| n.has_tag_name("innerBoundaryIs"))
        .filter_map(parse_ring)
        .collect();

    // Polygon::new ferme les rings si nécessaire
    Some(Polygon::new(exterior, interiors))
}

/// MultiGeometry : homogène -> Multi*, hétérogène -> GeometryCollection
fn parse_multi_geometry(node: Node) -> Option<Geometry> {
    let mut parts = Vec::new();
    collect_parts(node, &mut parts);

    if parts.is_empty() {
        return None;
    }

    if parts.iter().all(|g| matches!(g, Geometry::Point(_))) {
        let points = parts
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Point(p) => Some(p),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiPoint(MultiPoint::new(points)));
    }

    if parts.iter().all(|g| matches!(g, Geometry::LineString(_))) {
        let lines = parts
            .into_iter()
            .filter_map(|g| match g {
                Geometry::LineString(l) => Some(l),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiLineString(MultiLineString::new(lines)));
    }

    if parts.iter().all(|g| matches!(g, Geometry::Polygon(_))) {
        let polygons = parts
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Polygon(p) => Some(p),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)));
    }

    Some(Geometry::GeometryCollection(GeometryCollection::new_from(
        parts,
    )))
}

/// Aplatit les MultiGeometry imbriqués
fn collect_parts(node: Node, parts: &mut Vec<Geometry>) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "MultiGeometry" => collect_parts(child, parts),
            _ => {
                if let Some(geometry) = parse_geometry(child) {
                    parts.push(geometry);
                }
            }
        }
    }
}

/// Coordonnées du fils `coordinates` d'un élément
fn coordinates_of(node: Node) -> Vec<Coord> {
    child_element(node, "coordinates")
        .map(|c| parse_coordinates(&text_content(c)))
        .unwrap_or_default()
}

/// Parse un bloc `lon,lat[,alt] lon,lat[,alt] ...` (altitude ignorée)
pub fn parse_coordinates(text: &str) -> Vec<Coord> {
    text.split_ascii_whitespace()
        .filter_map(|tuple| {
            let coord = parse_tuple(tuple);
            if coord.is_none() {
                warn!(tuple = tuple, "Skipping unparsable coordinate tuple");
            }
            coord
        })
        .collect()
}

#[inline]
fn parse_tuple(tuple: &str) -> Option<Coord> {
    let mut parts = tuple.split(',');
    let x: f64 = fast_float::parse(parts.next()?).ok()?;
    let y: f64 = fast_float::parse(parts.next()?).ok()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Coord { x, y })
}
