//! Parsers des documents uploadés (KML, CSV)

pub mod geometry;
pub mod identifier;
pub mod kml;
pub mod style;
pub mod table;

use roxmltree::Node;

/// Premier enfant élément portant ce nom local
pub(crate) fn child_element<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Texte trimé d'un enfant élément; `None` s'il est absent ou vide
pub(crate) fn child_text(node: Node, name: &str) -> Option<String> {
    let text = text_content(child_element(node, name)?);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Contenu texte complet d'un élément (texte et CDATA des descendants)
pub(crate) fn text_content(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
