//! XML utility functions for turning an export document into record nodes.

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{ExportError, Result};
use crate::types::{RecordNode, Tag};

/// Byte order mark some exporters prepend to the document.
const UTF8_BOM: &str = "\u{feff}";

/// Decode raw input bytes as UTF-8 text, dropping a leading BOM.
///
/// # Errors
/// `ExportError::MalformedInput` if the bytes are not valid UTF-8.
pub fn decode_input(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ExportError::MalformedInput(format!("input is not valid UTF-8: {e}")))?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// Parse an export document.
///
/// Exports carry an internal DTD subset (`<!DOCTYPE HealthData [...]>`),
/// so DTDs are allowed.
///
/// # Errors
/// `ExportError::MalformedInput` if the text is not well-formed XML.
pub fn parse_document(text: &str) -> Result<Document<'_>> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Ok(Document::parse_with_options(text, options)?)
}

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use health_export::xml::get_tag_name;
///
/// let xml = r#"<HealthData><Record type="x"/></HealthData>"#;
/// let doc = Document::parse(xml).unwrap();
/// let record = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(record), "Record");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Get all element children of a node.
///
/// Excludes text nodes, comments and processing instructions.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Detach an element into an owned record node.
///
/// Only the element's own attributes are kept; nested children such as
/// `MetadataEntry` or `HeartRateVariabilityMetadataList` are not part of
/// the table layout.
pub fn to_record_node(node: Node<'_, '_>) -> RecordNode {
    let attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    RecordNode {
        tag: Tag::from_name(get_tag_name(node)),
        attributes,
    }
}

/// Read the root's immediate element children as record nodes, in
/// document order.
///
/// # Errors
/// `ExportError::MalformedInput` if the bytes are not UTF-8 or not
/// well-formed XML. No nodes are returned in that case.
///
/// # Examples
/// ```
/// use health_export::xml::read_nodes;
/// use health_export::types::Tag;
///
/// let xml = br#"<HealthData><Me/><Record type="HKQuantityTypeIdentifierStepCount" value="5"/></HealthData>"#;
/// let nodes = read_nodes(xml).unwrap();
/// assert_eq!(nodes.len(), 2);
/// assert_eq!(nodes[1].tag, Tag::Record);
/// ```
pub fn read_nodes(bytes: &[u8]) -> Result<Vec<RecordNode>> {
    let text = decode_input(bytes)?;
    let doc = parse_document(text)?;
    let nodes: Vec<RecordNode> = element_children(doc.root_element())
        .map(to_record_node)
        .collect();

    tracing::debug!(nodes = nodes.len(), "Read top-level export elements");
    Ok(nodes)
}
