use rimpatch_parsers_xml::{Document, NodeId};

/// Strip up to `amount` leading tabs from every line but the first of each
/// text and comment node under `node`.
pub fn subtract_indent(doc: &mut Document, node: NodeId, amount: usize) {
    if amount == 0 {
        return;
    }
    for n in doc.descendants(node) {
        if let Some(text) = doc.text_mut(n) {
            if text.contains('\n') {
                *text = dedent_lines(text, amount);
            }
        }
    }
}

fn dedent_lines(s: &str, amount: usize) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, line) in s.split('\n').enumerate() {
        if i == 0 {
            out.push_str(line);
            continue;
        }
        out.push('\n');
        let tabs = line
            .bytes()
            .take(amount)
            .take_while(|b| *b == b'\t')
            .count();
        out.push_str(&line[tabs..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimpatch_parsers_xml::{parse_document, serialize};

    #[test]
    fn first_line_is_left_alone() {
        assert_eq!(dedent_lines("\t\tx\n\t\t\ty\n\tz", 2), "\t\tx\n\ty\nz");
    }

    #[test]
    fn spaces_and_crlf_are_preserved() {
        assert_eq!(dedent_lines("a\r\n\t\t  b\r\n    c", 1), "a\r\n\t  b\r\n    c");
    }

    #[test]
    fn applies_to_text_and_comments_in_subtree() {
        let mut doc = parse_document("<a>\n\t\t<!--\n\t\tnote -->\n\t\t<b>\n\t\t\tx\n\t\t</b>\n\t</a>").unwrap();
        let root = doc.root_element().unwrap();
        subtract_indent(&mut doc, root, 1);
        assert_eq!(
            serialize(&doc),
            "<a>\n\t<!--\n\tnote -->\n\t<b>\n\t\tx\n\t</b>\n</a>"
        );
    }
}
