use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Flattened view of a small XML descriptor.
///
/// Every element is recorded once, in document order, under its slash-joined
/// path of local names starting at the root (`project/parent/version`).
/// Namespace prefixes are dropped; text is trimmed; empty elements record an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: String,
    elements: Vec<(String, String)>,
}

impl XmlDocument {
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut root: Option<String> = None;
        let mut stack: Vec<String> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        let mut elements = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return Err(anyhow!(
                        "malformed XML at byte {}: {err}",
                        reader.buffer_position()
                    ))
                }
            };
            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    if stack.is_empty() {
                        if root.is_some() {
                            bail!("XML document has more than one root element");
                        }
                        root = Some(name.clone());
                    }
                    stack.push(name);
                    texts.push(String::new());
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                    if stack.is_empty() {
                        if root.is_some() {
                            bail!("XML document has more than one root element");
                        }
                        root = Some(name.clone());
                    }
                    stack.push(name);
                    elements.push((stack.join("/"), String::new()));
                    stack.pop();
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|err| anyhow!("malformed XML text: {err}"))?;
                    if let Some(buffer) = texts.last_mut() {
                        buffer.push_str(&value);
                    }
                }
                Event::CData(data) => {
                    let value = data.into_inner();
                    if let Some(buffer) = texts.last_mut() {
                        buffer.push_str(&String::from_utf8_lossy(&value));
                    }
                }
                Event::End(_) => {
                    let path = stack.join("/");
                    stack.pop();
                    let text = texts.pop().unwrap_or_default();
                    elements.push((path, text.trim().to_string()));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            bail!("unexpected end of XML document inside <{open}>");
        }
        let Some(root) = root else {
            bail!("XML document has no root element");
        };

        Ok(Self { root, elements })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Text of the first element at `path`, if present.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, text)| text.as_str())
    }

    /// Text of every element at `path`, in document order.
    pub fn texts<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.elements
            .iter()
            .filter(move |(candidate, _)| candidate == path)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.elements.iter().any(|(candidate, _)| candidate == path)
    }

    /// Like [`XmlDocument::text`], but blank values count as absent.
    pub fn non_empty_text(&self, path: &str) -> Option<String> {
        self.text(path)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Reads an XML file, decoding it by its byte order mark or `encoding` declaration.
pub fn read_xml_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_xml(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

/// Decodes raw XML bytes; undeclared documents are UTF-8.
pub fn decode_xml(bytes: &[u8]) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => (encoding, &bytes[bom_length..]),
        None => (declared_encoding(bytes)?.unwrap_or(UTF_8), bytes),
    };

    let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) else {
        bail!("document is not valid {}", encoding.name());
    };
    Ok(text.into_owned())
}

fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    if !bytes.starts_with(b"<?xml") {
        return Ok(None);
    }
    let Some(end) = bytes.windows(2).position(|window| window == b"?>") else {
        return Ok(None);
    };
    let declaration = String::from_utf8_lossy(&bytes[..end]);
    let Some(start) = declaration.find("encoding") else {
        return Ok(None);
    };

    let value = declaration[start + "encoding".len()..]
        .trim_start()
        .strip_prefix('=')
        .map(str::trim_start)
        .and_then(|rest| {
            let quote = rest.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
            let rest = &rest[1..];
            rest.find(quote).map(|close| &rest[..close])
        });
    let Some(label) = value else {
        bail!("malformed encoding in XML declaration");
    };

    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) => Ok(Some(encoding)),
        None => bail!("unsupported XML encoding '{label}'"),
    }
}

pub fn escape_text(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}
