//! XML parsing utilities shared by the part parsers

use quick_xml::events::BytesStart;
use quick_xml::Reader;

/// XML reader utilities for parsing WordprocessingML content
pub struct XmlParser;

impl XmlParser {
    /// Create a reader that drops whitespace-only text.
    ///
    /// Suitable for parts whose payload lives entirely in attributes.
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        reader
    }

    /// Create a reader that reports text exactly as written
    pub fn from_string_preserving(content: &str) -> Reader<&[u8]> {
        Reader::from_str(content)
    }

    /// Get an attribute value from an event, unescaped
    pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .map(|a| match a.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).to_string(),
            })
    }

    /// Get an attribute value with a namespace prefix
    pub fn get_prefixed_attribute(event: &BytesStart, prefix: &str, local: &str) -> Option<String> {
        let key = format!("{}:{}", prefix, local);
        Self::get_attribute(event, key.as_bytes())
    }

    /// Get a w: namespaced attribute (most common in DOCX)
    pub fn get_w_attribute(event: &BytesStart, name: &str) -> Option<String> {
        Self::get_prefixed_attribute(event, "w", name)
            .or_else(|| Self::get_attribute(event, name.as_bytes()))
    }

    /// Get a r: namespaced attribute
    pub fn get_r_attribute(event: &BytesStart, name: &str) -> Option<String> {
        Self::get_prefixed_attribute(event, "r", name)
    }

    /// All attributes as (local name, unescaped value), skipping namespace declarations
    pub fn local_attributes(event: &BytesStart) -> Vec<(String, String)> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .filter(|a| {
                let key = a.key.as_ref();
                key != b"xmlns" && !key.starts_with(b"xmlns:")
            })
            .map(|a| {
                let key = Self::local_name(a.key.as_ref()).to_string();
                let value = match a.unescape_value() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&a.value).to_string(),
                };
                (key, value)
            })
            .collect()
    }

    /// Parse a boolean value (0/1, true/false, on/off)
    pub fn parse_bool(value: &str) -> bool {
        matches!(value.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
    }

    /// Element or attribute name without its namespace prefix
    pub fn local_name(name: &[u8]) -> &str {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        match name_str.rfind(':') {
            Some(pos) => &name_str[pos + 1..],
            None => name_str,
        }
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        Self::local_name(name) == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;

    #[test]
    fn test_parse_bool() {
        assert!(XmlParser::parse_bool("1"));
        assert!(XmlParser::parse_bool("true"));
        assert!(XmlParser::parse_bool("on"));
        assert!(!XmlParser::parse_bool("0"));
        assert!(!XmlParser::parse_bool("false"));
    }

    #[test]
    fn test_matches_element() {
        assert!(XmlParser::matches_element(b"p", "p"));
        assert!(XmlParser::matches_element(b"w:p", "p"));
        assert!(!XmlParser::matches_element(b"w:r", "p"));
        assert!(!XmlParser::matches_element(b"w:pPr", "p"));
    }

    #[test]
    fn test_attributes_are_unescaped() {
        let mut reader = XmlParser::from_string(
            r#"<w:ins xmlns:w="urn:w" w:id="3" w:author="A &amp; B"/>"#,
        );
        let mut buf = Vec::new();
        match reader.read_event_into(&mut buf).unwrap() {
            Event::Empty(e) => {
                assert_eq!(XmlParser::get_w_attribute(&e, "author").as_deref(), Some("A & B"));
                assert_eq!(
                    XmlParser::local_attributes(&e),
                    vec![
                        ("id".to_string(), "3".to_string()),
                        ("author".to_string(), "A & B".to_string()),
                    ]
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_preserving_reader_keeps_whitespace() {
        let mut reader = XmlParser::from_string_preserving("<t> a </t>");
        let mut buf = Vec::new();
        let mut texts = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Text(t) => texts.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        assert_eq!(texts, vec![" a "]);
    }
}
