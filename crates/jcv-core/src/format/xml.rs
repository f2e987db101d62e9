//! XML to JSON conversion.
//!
//! Elements map to objects: attributes become `@name` keys, child elements
//! become keys (repeated names collapse into arrays), and character data
//! becomes the element value itself for text-only elements or a `#text` key
//! for mixed content. The document root's name becomes the single top-level
//! key.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::FormatError;

struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value =
                attribute.unescape_value().map_err(quick_xml::Error::from)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self { name, attributes, children: Vec::new(), text: String::new() })
    }

    fn into_value(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        if self.attributes.is_empty() && self.children.is_empty() {
            let value = if text.is_empty() { Value::Null } else { super::infer_scalar(&text) };
            return (self.name, value);
        }

        let mut object = Map::new();
        for (key, value) in self.attributes {
            object.insert(format!("@{key}"), super::infer_scalar(&value));
        }
        for (key, value) in self.children {
            match object.get_mut(&key) {
                // Repeated child names collapse into an array.
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    object.insert(key, Value::Array(vec![first, value]));
                }
                None => {
                    object.insert(key, value);
                }
            }
        }
        if !text.is_empty() {
            object.insert("#text".to_string(), Value::String(text));
        }
        (self.name, Value::Object(object))
    }
}

/// Parses an XML document into a JSON value.
pub(crate) fn parse(text: &str) -> Result<Value, FormatError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(Element::from_start(&start)?);
            }
            Event::Empty(start) => {
                let (name, value) = Element::from_start(&start)?.into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(event) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&event.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(event) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&event.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    let (name, value) = element.into_value();
                    attach(&mut stack, &mut root, name, value);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no data for the JSON mapping.
            _ => {}
        }
    }

    let (name, value) = root.ok_or(FormatError::MissingXmlRoot)?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push((name, value));
    } else if root.is_none() {
        *root = Some((name, value));
    }
}
