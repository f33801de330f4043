//! Zip-level access to an OPC package.
//!
//! The reader decompresses every entry up front: parts are visited in relationship
//! order, not archive order, so random access by exact name is needed throughout a load.
//! The writer assembles the archive in memory and hands back the finished bytes.
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the buffer reserved from an entry's declared size. The header is
/// untrusted; larger entries grow the buffer as they are read.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Fully buffered view of a zip archive.
pub struct PhysPkgReader {
    /// Entry names in archive order
    names: Vec<String>,

    /// Decompressed entry contents keyed by entry name
    blobs: HashMap<String, Vec<u8>>,
}

impl PhysPkgReader {
    /// Open a package file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Read a package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Read every file entry of a zip stream into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut names = Vec::with_capacity(archive.len());
        let mut blobs = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut blob = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
            entry.read_to_end(&mut blob)?;
            if blobs.insert(name.clone(), blob).is_none() {
                names.push(name);
            }
        }

        Ok(Self { names, blobs })
    }

    /// Bytes of the part at `pack_uri`. Exact match only.
    pub fn blob_for(&self, pack_uri: &PackURI) -> Result<&[u8]> {
        self.blobs
            .get(pack_uri.membername())
            .map(Vec::as_slice)
            .ok_or_else(|| OpcError::PartNotFound(pack_uri.to_string()))
    }

    /// `[Content_Types].xml`, which every package must carry.
    pub fn content_types_xml(&self) -> Result<&[u8]> {
        self.blob_for(&PackURI::new(CONTENT_TYPES_URI)?)
    }

    /// Relationships part of `source_uri`, or `None` if the package has none for it.
    pub fn rels_xml_for(&self, source_uri: &PackURI) -> Option<&[u8]> {
        self.blobs
            .get(source_uri.rels_uri().membername())
            .map(Vec::as_slice)
    }

    /// Entry names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.blobs.contains_key(pack_uri.membername())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// In-memory zip writer using Deflate for every entry.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Append one entry.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.archive.start_file(pack_uri.membername(), options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finalize the central directory and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.archive.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut writer = PhysPkgWriter::new();
        let sheet = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        writer.write(&sheet, b"<worksheet/>").unwrap();
        let zip_data = writer.finish().unwrap();

        let reader = PhysPkgReader::from_bytes(&zip_data).unwrap();
        assert_eq!(reader.blob_for(&sheet).unwrap(), b"<worksheet/>");
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_entry_larger_than_preallocation() {
        let big: Vec<u8> = (0..(2 * MAX_PREALLOCATION as usize + 17)).map(|i| (i % 251) as u8).collect();
        let media = PackURI::new("/xl/media/image1.bin").unwrap();
        let mut writer = PhysPkgWriter::new();
        writer.write(&media, &big).unwrap();

        let reader = PhysPkgReader::from_bytes(&writer.finish().unwrap()).unwrap();
        assert_eq!(reader.blob_for(&media).unwrap(), big.as_slice());
    }

    #[test]
    fn test_exact_lookup_only() {
        let mut writer = PhysPkgWriter::new();
        writer
            .write(&PackURI::new("/xl/media/image1.PNG").unwrap(), b"png")
            .unwrap();
        let reader = PhysPkgReader::from_bytes(&writer.finish().unwrap()).unwrap();

        let lower = PackURI::new("/xl/media/image1.png").unwrap();
        assert!(!reader.contains(&lower));
        assert!(matches!(
            reader.blob_for(&lower),
            Err(OpcError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_member_names_and_rels() {
        let mut writer = PhysPkgWriter::new();
        writer
            .write(&PackURI::new("/[Content_Types].xml").unwrap(), b"<Types/>")
            .unwrap();
        writer
            .write(&PackURI::new("/xl/_rels/workbook.xml.rels").unwrap(), b"<Relationships/>")
            .unwrap();
        writer
            .write(&PackURI::new("/xl/workbook.xml").unwrap(), b"<workbook/>")
            .unwrap();
        let reader = PhysPkgReader::from_bytes(&writer.finish().unwrap()).unwrap();

        let names: Vec<&str> = reader.member_names().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "xl/_rels/workbook.xml.rels", "xl/workbook.xml"]
        );
        assert_eq!(reader.content_types_xml().unwrap(), b"<Types/>");

        let workbook = PackURI::new("/xl/workbook.xml").unwrap();
        assert_eq!(reader.rels_xml_for(&workbook), Some(&b"<Relationships/>"[..]));
        let sheet = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        assert_eq!(reader.rels_xml_for(&sheet), None);
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            PhysPkgReader::from_bytes(b"definitely not a zip"),
            Err(OpcError::ZipError(_))
        ));
    }
}
