use crate::tree::{Document, NodeId, NodeKind};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[cfg(windows)]
pub const NATIVE_EOL: &str = "\r\n";
#[cfg(not(windows))]
pub const NATIVE_EOL: &str = "\n";

/// Serialize the document body (no declaration).
///
/// Whitespace that precedes the first document-level node is dropped; the
/// declaration line written by [`to_xml_file`] takes its place.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    let mut started = false;
    for &id in doc.top_level() {
        if !started {
            if doc.text(id).is_some() {
                continue;
            }
            started = true;
        }
        write_node(doc, id, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(el.name());
            for attr in el.attributes() {
                let quote = if attr.raw_value().contains('"') { '\'' } else { '"' };
                out.push(' ');
                out.push_str(attr.name());
                out.push('=');
                out.push(quote);
                out.push_str(attr.raw_value());
                out.push(quote);
            }
            if el.is_self_closing() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in el.children() {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
        NodeKind::Text(raw) => out.push_str(raw),
        NodeKind::CData(raw) => {
            out.push_str("<![CDATA[");
            out.push_str(raw);
            out.push_str("]]>");
        }
        NodeKind::Comment(raw) => {
            out.push_str("<!--");
            out.push_str(raw);
            out.push_str("-->");
        }
    }
}

/// Convert every line ending to the host platform's convention.
pub fn normalize_eol(s: &str) -> String {
    let unix = s.replace("\r\n", "\n");
    if NATIVE_EOL == "\n" {
        unix
    } else {
        unix.replace('\n', NATIVE_EOL)
    }
}

/// Full file text: fixed declaration, newline, serialized tree, native line endings.
pub fn to_xml_file(doc: &Document) -> String {
    normalize_eol(&format!("{XML_DECLARATION}\n{}", serialize(doc)))
}
