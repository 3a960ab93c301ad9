//! Property bag import/export
//!
//! Converts between `w:rPr` / `w:pPr` style children and `PropertyMap`
//! entries. A child with a single `w:val` becomes a value, a known on/off
//! element becomes a toggle, anything else keeps all of its attributes.
//! Elements with children other than `w:numPr` are kept as raw markup.

use crate::docx::reader::XmlParser;
use doc_model::{PropertyMap, PropertyValue, TOGGLE_PROPERTIES};
use quick_xml::events::BytesStart;

/// Properties written as a container of `w:val` children instead of attributes
const NESTED_PROPERTIES: &[&str] = &["numPr"];

/// Whether a container property is flattened into `w:val` pairs.
/// Every other container is kept as `PropertyValue::Raw`.
pub fn is_nested_property(name: &str) -> bool {
    NESTED_PROPERTIES.contains(&name)
}

/// Read one empty property element
pub fn read_property(e: &BytesStart) -> (String, PropertyValue) {
    let name = XmlParser::local_name(e.name().as_ref()).to_string();
    let attrs = XmlParser::local_attributes(e);

    let value = if TOGGLE_PROPERTIES.contains(&name.as_str()) {
        let on = attrs
            .iter()
            .find(|(k, _)| k == "val")
            .map(|(_, v)| XmlParser::parse_bool(v))
            .unwrap_or(true);
        PropertyValue::Toggle(on)
    } else if attrs.is_empty() {
        PropertyValue::Toggle(true)
    } else if attrs.len() == 1 && attrs[0].0 == "val" {
        PropertyValue::Value(attrs[0].1.clone())
    } else {
        PropertyValue::Attributes(attrs)
    };
    (name, value)
}

/// Value contributed by a child of a nested property such as `w:numPr`
pub fn read_nested_child(e: &BytesStart) -> (String, String) {
    let name = XmlParser::local_name(e.name().as_ref()).to_string();
    let value = XmlParser::get_w_attribute(e, "val").unwrap_or_default();
    (name, value)
}

/// Write one property element
pub fn write_property(xml: &mut String, name: &str, value: &PropertyValue) {
    match value {
        PropertyValue::Toggle(true) => xml.push_str(&format!("<w:{}/>", name)),
        PropertyValue::Toggle(false) => xml.push_str(&format!(r#"<w:{} w:val="0"/>"#, name)),
        PropertyValue::Value(val) => {
            xml.push_str(&format!(r#"<w:{} w:val="{}"/>"#, name, escape_xml_attr(val)))
        }
        PropertyValue::Attributes(attrs) if NESTED_PROPERTIES.contains(&name) => {
            xml.push_str(&format!("<w:{}>", name));
            for (child, val) in attrs {
                xml.push_str(&format!(r#"<w:{} w:val="{}"/>"#, child, escape_xml_attr(val)));
            }
            xml.push_str(&format!("</w:{}>", name));
        }
        PropertyValue::Attributes(attrs) => {
            xml.push_str(&format!("<w:{}", name));
            for (key, val) in attrs {
                xml.push_str(&format!(r#" w:{}="{}""#, key, escape_xml_attr(val)));
            }
            xml.push_str("/>");
        }
        PropertyValue::Raw(source) => xml.push_str(source),
    }
}

/// Write every entry of a map in the given schema order
pub fn write_property_map(xml: &mut String, map: &PropertyMap, order: &[&str]) {
    for (name, value) in map.ordered(order) {
        write_property(xml, name, value);
    }
}

/// Write a complete property bag element such as `<w:rPr>...</w:rPr>`
pub fn write_property_bag(xml: &mut String, tag: &str, map: &PropertyMap, order: &[&str]) {
    if map.is_empty() {
        xml.push_str(&format!("<w:{}/>", tag));
        return;
    }
    xml.push_str(&format!("<w:{}>", tag));
    write_property_map(xml, map, order);
    xml.push_str(&format!("</w:{}>", tag));
}

/// Escape XML text content
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape XML attribute value
pub fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
