//! Numbering.xml writer
//!
//! Generates numbering.xml from a numbering registry. The per-definition
//! writers are also used by the selective merge to re-emit single entries.

use crate::docx::namespaces;
use crate::docx::properties_io::escape_xml_attr;
use doc_model::{AbstractNum, ListLevel, NumberingInstance, NumberingRegistry};

/// Writer for numbering.xml
#[derive(Debug, Default)]
pub struct NumberingWriter;

impl NumberingWriter {
    /// Create a new numbering writer
    pub fn new() -> Self {
        Self
    }

    /// Generate a complete numbering.xml part
    pub fn write(&self, registry: &NumberingRegistry) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<w:numbering xmlns:w="{}" xmlns:r="{}">"#,
            namespaces::W,
            namespaces::R,
        ));

        // Abstract definitions must precede every instance
        for abstract_num in registry.all_abstract_nums() {
            self.write_abstract_num(&mut xml, abstract_num);
        }
        for instance in registry.all_instances() {
            self.write_num_instance(&mut xml, instance);
        }

        xml.push_str("</w:numbering>");
        xml
    }

    /// Write an abstract numbering definition
    pub fn write_abstract_num(&self, xml: &mut String, abs: &AbstractNum) {
        xml.push_str(&format!(
            r#"<w:abstractNum w:abstractNumId="{}">"#,
            abs.id.0
        ));
        xml.push_str(&format!(
            r#"<w:multiLevelType w:val="{}"/>"#,
            abs.multi_level_type.as_wml()
        ));
        if let Some(ref name) = abs.name {
            xml.push_str(&format!(r#"<w:name w:val="{}"/>"#, escape_xml_attr(name)));
        }
        for level in &abs.levels {
            self.write_level(xml, level);
        }
        xml.push_str("</w:abstractNum>");
    }

    /// Write a list level definition, children in schema order
    fn write_level(&self, xml: &mut String, level: &ListLevel) {
        xml.push_str(&format!(r#"<w:lvl w:ilvl="{}">"#, level.level));
        xml.push_str(&format!(r#"<w:start w:val="{}"/>"#, level.start));
        xml.push_str(&format!(r#"<w:numFmt w:val="{}"/>"#, level.format.as_wml()));
        if let Some(restart) = level.restart_after_level {
            xml.push_str(&format!(r#"<w:lvlRestart w:val="{}"/>"#, restart));
        }
        if level.is_legal {
            xml.push_str("<w:isLgl/>");
        }
        xml.push_str(&format!(r#"<w:suff w:val="{}"/>"#, level.suffix.as_wml()));
        xml.push_str(&format!(r#"<w:lvlText w:val="{}"/>"#, escape_xml_attr(&level.text)));
        xml.push_str(&format!(r#"<w:lvlJc w:val="{}"/>"#, level.alignment.as_wml()));

        xml.push_str("<w:pPr>");
        xml.push_str(&format!(
            r#"<w:ind w:left="{}" w:hanging="{}"/>"#,
            level.indent, level.hanging
        ));
        xml.push_str("</w:pPr>");

        let mut rpr = String::new();
        if let Some(ref font) = level.font {
            let font = escape_xml_attr(font);
            rpr.push_str(&format!(
                r#"<w:rFonts w:ascii="{}" w:hAnsi="{}" w:hint="default"/>"#,
                font, font
            ));
        }
        if level.bold {
            rpr.push_str("<w:b/>");
        }
        if level.italic {
            rpr.push_str("<w:i/>");
        }
        if let Some(ref color) = level.color {
            rpr.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape_xml_attr(color)));
        }
        if let Some(size) = level.font_size {
            rpr.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
        }
        if level.underline {
            rpr.push_str(r#"<w:u w:val="single"/>"#);
        }
        if !rpr.is_empty() {
            xml.push_str("<w:rPr>");
            xml.push_str(&rpr);
            xml.push_str("</w:rPr>");
        }

        xml.push_str("</w:lvl>");
    }

    /// Write a numbering instance
    pub fn write_num_instance(&self, xml: &mut String, inst: &NumberingInstance) {
        xml.push_str(&format!(r#"<w:num w:numId="{}">"#, inst.id.0));
        xml.push_str(&format!(r#"<w:abstractNumId w:val="{}"/>"#, inst.abstract_num_id.0));

        for (level, override_data) in &inst.level_overrides {
            xml.push_str(&format!(r#"<w:lvlOverride w:ilvl="{}">"#, level));
            if let Some(start) = override_data.start_override {
                xml.push_str(&format!(r#"<w:startOverride w:val="{}"/>"#, start));
            }
            if let Some(ref replacement) = override_data.level_override {
                self.write_level(xml, replacement);
            }
            xml.push_str("</w:lvlOverride>");
        }

        xml.push_str("</w:num>");
    }
}
