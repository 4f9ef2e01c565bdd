//! Minimal style tree: attribute-carrying nested elements plus the text
//! content needed for metadata extraction. Namespace prefixes are
//! stripped so `cs:choose` and `choose` read the same.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One element of a parsed style description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<StyleNode>,
    pub text: String,
}

impl StyleNode {
    /// First attribute value with the given name, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&StyleNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn local_name(raw: &[u8]) -> String {
    let full = String::from_utf8_lossy(raw);
    match full.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => full.into_owned(),
    }
}

fn collect_attrs(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    // Individually malformed attributes are skipped, not fatal.
    for attr in e.attributes().flatten() {
        let key = local_name(attr.key.as_ref());
        if let Ok(value) = attr.unescape_value() {
            attrs.push((key, value.into_owned()));
        }
    }
    attrs
}

/// Parse a style description into a tree rooted at its first element.
///
/// Structural defects (mismatched tags, truncated documents) are errors
/// here; callers that want degraded behavior handle the `Err` themselves.
pub fn parse_style_tree(content: &str) -> Result<StyleNode> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut stack: Vec<StyleNode> = Vec::new();
    let mut root: Option<StyleNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(StyleNode {
                    name: local_name(e.name().as_ref()),
                    attrs: collect_attrs(&e),
                    children: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let node = StyleNode {
                    name: local_name(e.name().as_ref()),
                    attrs: collect_attrs(&e),
                    children: Vec::new(),
                    text: String::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => root = Some(node),
                    None => {}
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => {
                            if root.is_none() {
                                root = Some(node);
                            }
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(node), Ok(text)) = (stack.last_mut(), t.unescape()) {
                    if !node.text.is_empty() {
                        node.text.push(' ');
                    }
                    node.text.push_str(text.trim());
                }
            }
            Event::CData(t) => {
                if let Some(node) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&t);
                    if !node.text.is_empty() {
                        node.text.push(' ');
                    }
                    node.text.push_str(text.trim());
                }
            }
            Event::Eof => break,
            // Comments, processing instructions, declarations.
            _ => {}
        }
    }

    root.ok_or(Error::EmptyDocument)
}
