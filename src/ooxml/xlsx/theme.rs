//! Theme part (`xl/theme/theme1.xml`), carried verbatim.
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::xlsx::template::DEFAULT_THEME_XML;

#[derive(Debug, Clone)]
pub struct Theme {
    part: XmlPart,
}

impl Theme {
    pub fn load(xml: Vec<u8>) -> Result<Self> {
        Ok(Self {
            part: XmlPart::load(ct::OFC_THEME, xml)?,
        })
    }

    pub fn part(&self) -> &XmlPart {
        &self.part
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            part: XmlPart::new(ct::OFC_THEME, DEFAULT_THEME_XML.as_bytes().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::part::Part;

    #[test]
    fn test_loaded_theme_is_kept_verbatim() {
        let xml = br#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Custom"/>"#;
        let theme = Theme::load(xml.to_vec()).unwrap();
        assert_eq!(theme.part().blob(), &xml[..]);
        assert_eq!(theme.part().content_type(), ct::OFC_THEME);
    }
}
