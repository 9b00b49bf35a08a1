//! JATS reference reader
//!
//! Builds `CitationElement` trees from `element-citation`, `mixed-citation`,
//! `ref` and `ref-list` XML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::element::CitationElement;
use crate::error::ParseError;
use crate::normalizer::CITATION_ROOT;

const MIXED_CITATION: &str = "mixed-citation";

/// Parse any XML fragment with a single root into an element tree.
pub fn parse_tree(xml: &str) -> Result<CitationElement, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    // Open elements with the raw text gathered so far
    let mut stack: Vec<(CitationElement, String)> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push((start_element(e)?, String::new())),
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e)?;
                close(&mut stack, &mut root, element, String::new())?;
            }
            Ok(Event::End(_)) => {
                let (element, raw) = stack.pop().ok_or(ParseError::Empty)?;
                close(&mut stack, &mut root, element, raw)?;
            }
            Ok(Event::Text(e)) => {
                if let Some((_, raw)) = stack.last_mut() {
                    raw.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some((_, raw)) = stack.last_mut() {
                    raw.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((open, _)) = stack.pop() {
        return Err(ParseError::Unclosed(open.tag));
    }
    root.ok_or(ParseError::Empty)
}

/// Parse a single citation. A `mixed-citation` is re-tagged as
/// `element-citation`; a `ref` wrapper yields its first citation.
pub fn parse_element_citation(xml: &str) -> Result<CitationElement, ParseError> {
    let tree = parse_tree(xml)?;
    let root_tag = tree.tag.clone();
    citations(tree)
        .into_iter()
        .next()
        .ok_or(ParseError::NoCitation(root_tag))
}

/// Parse every citation of a `ref-list` (or any wrapper), in document order.
pub fn parse_ref_list(xml: &str) -> Result<Vec<CitationElement>, ParseError> {
    let tree = parse_tree(xml)?;
    let found = citations(tree);
    tracing::debug!(citations = found.len(), "parsed reference list");
    Ok(found)
}

fn citations(tree: CitationElement) -> Vec<CitationElement> {
    let mut found = Vec::new();
    collect_citations(tree, &mut found);
    found
}

fn collect_citations(element: CitationElement, found: &mut Vec<CitationElement>) {
    if element.tag == CITATION_ROOT || element.tag == MIXED_CITATION {
        let mut citation = element;
        citation.tag = CITATION_ROOT.to_string();
        found.push(citation);
        return;
    }
    for child in element.children {
        collect_citations(child, found);
    }
}

fn start_element(e: &BytesStart) -> Result<CitationElement, ParseError> {
    let mut element = CitationElement::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn close(
    stack: &mut Vec<(CitationElement, String)>,
    root: &mut Option<CitationElement>,
    mut element: CitationElement,
    raw: String,
) -> Result<(), ParseError> {
    element.text = collapse_whitespace(&raw);
    match stack.last_mut() {
        Some((parent, parent_raw)) => {
            parent_raw.push_str(&raw);
            parent.children.push(element);
        }
        None if root.is_some() => return Err(ParseError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
