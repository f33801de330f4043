//! Media files (`xl/media/image{N}.{ext}`) shared by picture anchors.
//!
//! The workbook owns every media file in one arena; anchors hold a [`MediaId`]. A file
//! registered twice under the same resolved source path yields the same id, so two
//! pictures of one image share a single archive entry.
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use std::collections::{HashMap, HashSet};

/// Handle to a media file. Its index is the file's position in the workbook arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaId(pub(crate) usize);

impl MediaId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One image (or other binary) referenced from drawings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    source: Option<String>,
    suffix: String,
    mime_type: String,
    content: Vec<u8>,
}

impl MediaFile {
    /// Media created from bytes. The suffix is lower-cased; the MIME type follows from it.
    pub fn new(content: Vec<u8>, suffix: &str) -> Self {
        let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
        Self {
            source: None,
            mime_type: mime_for_suffix(&suffix).to_string(),
            suffix,
            content,
        }
    }

    /// Media whose identity is a resolved source path (package part or file).
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Arena of media files in index order.
#[derive(Debug, Clone, Default)]
pub struct MediaCollection {
    files: Vec<MediaFile>,
    by_source: HashMap<String, MediaId>,
}

impl MediaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a media file, returning the existing id when its source is already known.
    pub fn add(&mut self, file: MediaFile) -> MediaId {
        if let Some(source) = file.source.as_deref()
            && let Some(&id) = self.by_source.get(source)
        {
            return id;
        }
        let id = MediaId(self.files.len());
        if let Some(source) = file.source.clone() {
            self.by_source.insert(source, id);
        }
        self.files.push(file);
        id
    }

    /// Register a package part referenced by a picture. Content is filled in later by
    /// [`MediaCollection::fill`].
    pub fn register_part(&mut self, partname: &PackURI) -> MediaId {
        self.add(MediaFile::new(Vec::new(), partname.ext()).with_source(partname.as_str()))
    }

    /// Set the bytes of a registered file; suffix and MIME type follow `actual_suffix`.
    pub fn fill(&mut self, id: MediaId, content: Vec<u8>, actual_suffix: &str) {
        if let Some(file) = self.files.get_mut(id.0) {
            let source = file.source.take();
            *file = MediaFile::new(content, actual_suffix);
            file.source = source;
        }
    }

    pub fn get(&self, id: MediaId) -> Option<&MediaFile> {
        self.files.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediaId, &MediaFile)> {
        self.files.iter().enumerate().map(|(i, f)| (MediaId(i), f))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Keep only the files in `used`, closing the gaps. Returns the new id of every
    /// kept file.
    pub(crate) fn compact(&mut self, used: &HashSet<MediaId>) -> HashMap<MediaId, MediaId> {
        let mut remap = HashMap::with_capacity(used.len());
        self.by_source.clear();
        for (index, file) in std::mem::take(&mut self.files).into_iter().enumerate() {
            if !used.contains(&MediaId(index)) {
                continue;
            }
            let id = MediaId(self.files.len());
            if let Some(source) = file.source.clone() {
                self.by_source.insert(source, id);
            }
            self.files.push(file);
            remap.insert(MediaId(index), id);
        }
        remap
    }

    /// Archive location of a media file: `/xl/media/image{index + 1}.{suffix}`.
    ///
    /// Both the drawing relationship target and the written entry come from here.
    pub fn partname(&self, id: MediaId) -> Result<PackURI> {
        let suffix = self.files.get(id.0).map(|f| f.suffix.as_str()).unwrap_or("bin");
        PackURI::new(format!("/xl/media/image{}.{}", id.0 + 1, suffix))
    }
}

/// MIME type for a file suffix; `application/octet-stream` when unknown.
pub fn mime_for_suffix(suffix: &str) -> &'static str {
    match suffix.to_ascii_lowercase().as_str() {
        "png" => ct::PNG,
        "jpg" | "jpeg" | "jpe" => ct::JPEG,
        "gif" => ct::GIF,
        "bmp" => ct::BMP,
        "tif" | "tiff" => ct::TIFF,
        "emf" => ct::X_EMF,
        "wmf" => ct::X_WMF,
        "svg" => "image/svg+xml",
        _ => ct::OCTET_STREAM,
    }
}

/// Image format detected from magic bytes, as a file suffix.
pub fn sniff_suffix(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.starts_with(b"BM") && data.len() >= 26 {
        Some("bmp")
    } else {
        None
    }
}

/// Pixel size read from a PNG, GIF, BMP or JPEG header.
pub fn image_size(data: &[u8]) -> Option<(u32, u32)> {
    match sniff_suffix(data)? {
        "png" => {
            let w = u32::from_be_bytes(data.get(16..20)?.try_into().ok()?);
            let h = u32::from_be_bytes(data.get(20..24)?.try_into().ok()?);
            Some((w, h))
        },
        "gif" => {
            let w = u16::from_le_bytes(data.get(6..8)?.try_into().ok()?);
            let h = u16::from_le_bytes(data.get(8..10)?.try_into().ok()?);
            Some((w as u32, h as u32))
        },
        "bmp" => {
            let w = i32::from_le_bytes(data.get(18..22)?.try_into().ok()?);
            let h = i32::from_le_bytes(data.get(22..26)?.try_into().ok()?);
            Some((w.unsigned_abs(), h.unsigned_abs()))
        },
        "jpeg" => jpeg_size(data),
        _ => None,
    }
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_size(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let h = u16::from_be_bytes(data.get(pos + 5..pos + 7)?.try_into().ok()?);
            let w = u16::from_be_bytes(data.get(pos + 7..pos + 9)?.try_into().ok()?);
            return Some((w as u32, h as u32));
        }
        pos += 2 + len;
    }
    None
}
