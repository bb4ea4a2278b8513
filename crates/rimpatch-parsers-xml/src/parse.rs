use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::{Attribute, Document, Element, NodeId, NodeKind};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("bad attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("{0}")]
    Metadata(#[from] roxmltree::Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element (<{0}>)")]
    ExtraRoot(String),
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("text outside the root element")]
    StrayText,
    #[error("invalid UTF-8 in {0}")]
    Utf8(&'static str),
}

fn utf8<'a>(bytes: &'a [u8], what: &'static str) -> Result<&'a str, XmlError> {
    std::str::from_utf8(bytes).map_err(|_| XmlError::Utf8(what))
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = utf8(start.name().as_ref(), "tag name")?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref(), "attribute name")?.to_string();
        let raw = utf8(&attr.value, "attribute value")?.to_string();
        attributes.push(Attribute::from_raw(key, raw));
    }
    Ok(Element::new(name, attributes))
}

/// Parse a patch document into a [`Document`], keeping whitespace, comments
/// and entity spelling untouched. The XML declaration is not kept; the
/// serializer writes a fixed one.
pub fn parse_document(input: &str) -> Result<Document, XmlError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let id = doc.create(NodeKind::Element(element_from(&e)?));
                attach_element(&mut doc, &stack, id)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = doc.create(NodeKind::Element(element_from(&e)?));
                doc.mark_self_closing(id);
                attach_element(&mut doc, &stack, id)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                let raw = utf8(&t, "text")?;
                if stack.is_empty() && !raw.trim().is_empty() {
                    return Err(XmlError::StrayText);
                }
                let id = doc.create(NodeKind::Text(raw.to_string()));
                doc.append_child(stack.last().copied(), id);
            }
            Event::CData(c) => {
                if stack.is_empty() {
                    return Err(XmlError::StrayText);
                }
                let id = doc.create(NodeKind::CData(utf8(&c, "CDATA")?.to_string()));
                doc.append_child(stack.last().copied(), id);
            }
            Event::Comment(c) => {
                let id = doc.create(NodeKind::Comment(utf8(&c, "comment")?.to_string()));
                doc.append_child(stack.last().copied(), id);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        let name = doc.tag_name(*open).unwrap_or_default().to_string();
        return Err(XmlError::Unclosed(name));
    }
    if doc.root_element().is_none() {
        return Err(XmlError::NoRoot);
    }
    Ok(doc)
}

fn attach_element(doc: &mut Document, stack: &[NodeId], id: NodeId) -> Result<(), XmlError> {
    let parent = stack.last().copied();
    if parent.is_none() && doc.root_element().is_some() {
        let name = doc.tag_name(id).unwrap_or_default().to_string();
        return Err(XmlError::ExtraRoot(name));
    }
    doc.append_child(parent, id);
    Ok(())
}
