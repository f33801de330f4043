//! Embedded objects (`xl/embeddings/{file}`) owned by a worksheet.
use crate::ooxml::opc::constants::{content_type as ct, relationship_type};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OleObject {
    file_name: String,
    prog_id: String,
    shape_id: u32,
    content_type: String,
    content: Vec<u8>,
}

impl OleObject {
    /// Embed `content` under `xl/embeddings/{file_name}`. The content type follows the
    /// file extension unless one is given.
    pub fn new<N: Into<String>, P: Into<String>>(
        file_name: N,
        prog_id: P,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Self {
        let file_name = file_name.into();
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| embedding_content_type(extension(&file_name)).to_string());
        Self {
            file_name,
            prog_id: prog_id.into(),
            shape_id: 0,
            content_type,
            content,
        }
    }

    pub(crate) fn with_shape_id(mut self, shape_id: u32) -> Self {
        self.shape_id = shape_id;
        self
    }

    pub(crate) fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn prog_id(&self) -> &str {
        &self.prog_id
    }

    /// Id of the legacy VML shape that displays the object.
    pub fn shape_id(&self) -> u32 {
        self.shape_id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn suffix(&self) -> &str {
        extension(&self.file_name)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn partname(&self) -> Result<PackURI> {
        PackURI::new(format!("/xl/embeddings/{}", self.file_name))
    }

    /// Relationship type used from the worksheet: `package` for embedded Open XML
    /// documents, `oleObject` otherwise.
    pub fn reltype(&self) -> &'static str {
        if self.content_type.starts_with("application/vnd.openxmlformats-officedocument.")
            && self.content_type != ct::OFC_OLE_OBJECT
        {
            relationship_type::PACKAGE
        } else {
            relationship_type::OLE_OBJECT
        }
    }
}

fn extension(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Content type for an embedded file by extension.
pub fn embedding_content_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "bin" => ct::OFC_OLE_OBJECT,
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => ct::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_and_reltype() {
        let bin = OleObject::new("oleObject1.bin", "Package", vec![0xD0, 0xCF], None);
        assert_eq!(bin.content_type(), ct::OFC_OLE_OBJECT);
        assert_eq!(bin.reltype(), relationship_type::OLE_OBJECT);
        assert_eq!(bin.partname().unwrap().as_str(), "/xl/embeddings/oleObject1.bin");

        let doc = OleObject::new("report.docx", "Word.Document.12", vec![b'P', b'K'], None);
        assert_eq!(doc.reltype(), relationship_type::PACKAGE);
        assert_eq!(doc.suffix(), "docx");

        let custom = OleObject::new("data.dat", "Package", Vec::new(), Some("application/x-custom"));
        assert_eq!(custom.content_type(), "application/x-custom");
        assert_eq!(custom.reltype(), relationship_type::OLE_OBJECT);
    }
}
