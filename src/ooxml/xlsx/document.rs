//! The spreadsheet document: a workbook graph plus document properties, bound to the
//! file it was opened from or will be saved to.
use crate::ooxml::common::properties::DocumentProperties;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::xlsx::cell::CellValue;
use crate::ooxml::xlsx::chart::ChartId;
use crate::ooxml::xlsx::media::MediaId;
use crate::ooxml::xlsx::package;
use crate::ooxml::xlsx::workbook::{SheetType, Workbook};
use crate::ooxml::xlsx::worksheet::Worksheet;
use chrono::Utc;
use log::debug;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name used by [`Document::save`] for a document that was never opened or saved.
pub const DEFAULT_PACKAGE_NAME: &str = "Book1.xlsx";

/// An xlsx document.
///
/// # Examples
///
/// ```rust,no_run
/// use xlsx_opc::ooxml::xlsx::Document;
///
/// let mut doc = Document::new();
/// doc.write(1, 1, "Hello")?;
/// doc.write(2, 1, 42.0)?;
/// doc.set_property("title", "Greeting");
/// doc.save_as("hello.xlsx")?;
///
/// let reopened = Document::open("hello.xlsx")?;
/// assert_eq!(reopened.sheet_names(), vec!["Sheet1"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Document {
    workbook: Workbook,
    properties: DocumentProperties,

    /// Registry of the last loaded package; its defaults are kept on save
    content_types: Option<ContentTypes>,
    path: Option<PathBuf>,
}

impl Document {
    /// A new document with one empty worksheet.
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            properties: DocumentProperties::new(),
            content_types: None,
            path: None,
        }
    }

    /// Open an xlsx file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the .xlsx file
    ///
    /// # Errors
    ///
    /// [`OoxmlError::Format`] when a mandatory part or relationship is missing,
    /// [`OoxmlError::Parse`] when a mandatory part is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut doc = Self::new();
        doc.load(path)?;
        Ok(doc)
    }

    /// Read an xlsx package from a stream.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use xlsx_opc::ooxml::xlsx::Document;
    /// use std::io::Cursor;
    ///
    /// let data = std::fs::read("book.xlsx")?;
    /// let doc = Document::from_reader(Cursor::new(data))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut doc = Self::new();
        doc.load_from_reader(reader)?;
        Ok(doc)
    }

    /// Replace this document with the contents of `path`.
    ///
    /// On failure the document is left exactly as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let phys = PhysPkgReader::open(path)?;
        self.install(package::load(phys)?);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace this document with a package read from `reader`.
    ///
    /// On failure the document is left exactly as it was.
    pub fn load_from_reader<R: Read + Seek>(&mut self, reader: R) -> Result<()> {
        let phys = PhysPkgReader::from_reader(reader)?;
        self.install(package::load(phys)?);
        Ok(())
    }

    fn install(&mut self, loaded: package::LoadedPackage) {
        self.workbook = loaded.workbook;
        self.properties = loaded.properties;
        self.content_types = Some(loaded.content_types);
    }

    /// Where [`Document::save`] writes: the file last opened, loaded or saved by
    /// [`Document::save_as`], otherwise [`DEFAULT_PACKAGE_NAME`].
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(DEFAULT_PACKAGE_NAME))
    }

    /// Save to [`Document::path`].
    pub fn save(&mut self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.save_as(path)
    }

    /// Save to `path` and make it the document's path.
    ///
    /// The package is assembled in memory and written to a temporary file next to
    /// `path`, which then replaces it. A failed save leaves any existing file untouched.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| OoxmlError::Io(e.error))?;

        debug!(path = path.display().to_string().as_str(), bytes = bytes.len(); "document saved");
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the package to a stream.
    pub fn save_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// The complete package as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        package::save(&self.workbook, &self.properties, self.content_types.as_ref(), Utc::now())
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    // ---- properties --------------------------------------------------------

    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Set a document property. Known keys such as `title`, `creator` or `company`
    /// are written to their core.xml or app.xml elements.
    pub fn set_property<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.properties.set(key, value);
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.names().collect()
    }

    // ---- sheets -------------------------------------------------------------

    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheet_names()
    }

    /// Append a worksheet; `None` picks the next free `Sheet{N}` name.
    pub fn add_sheet(&mut self, name: Option<&str>) -> Result<()> {
        self.workbook.add_sheet(name, SheetType::Worksheet).map(|_| ())
    }

    pub fn add_chartsheet(&mut self, name: Option<&str>) -> Result<()> {
        self.workbook.add_sheet(name, SheetType::Chartsheet).map(|_| ())
    }

    pub fn insert_sheet(&mut self, index: usize, name: Option<&str>, sheet_type: SheetType) -> Result<()> {
        self.workbook.insert_sheet(index, name, sheet_type).map(|_| ())
    }

    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        self.workbook.rename_sheet(old_name, new_name)
    }

    pub fn copy_sheet(&mut self, source: &str, new_name: &str) -> Result<()> {
        self.workbook.copy_sheet(source, new_name).map(|_| ())
    }

    pub fn move_sheet(&mut self, name: &str, index: usize) -> Result<()> {
        self.workbook.move_sheet(name, index)
    }

    pub fn delete_sheet(&mut self, name: &str) -> Result<()> {
        self.workbook.delete_sheet(name)
    }

    /// Make `name` the active sheet, the target of cell reads and writes.
    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        self.workbook.set_active_sheet(name)
    }

    /// The active sheet, if it is a worksheet.
    pub fn current_worksheet(&self) -> Option<&Worksheet> {
        self.workbook.active_sheet().and_then(|s| s.as_worksheet())
    }

    pub fn current_worksheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.workbook.active_sheet_mut().and_then(|s| s.as_worksheet_mut())
    }

    fn require_worksheet(&mut self) -> Result<&mut Worksheet> {
        self.current_worksheet_mut()
            .ok_or_else(|| OoxmlError::InvalidArgument("the active sheet is not a worksheet".to_string()))
    }

    // ---- cells and objects on the active worksheet ---------------------------

    /// Value of a cell (1-based) on the active worksheet.
    pub fn read(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.current_worksheet()?.value(row, col)
    }

    /// Write a cell (1-based) on the active worksheet, keeping its style.
    pub fn write<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<()> {
        self.require_worksheet()?
            .set_value(row, col, value)
            .map_err(|e| OoxmlError::InvalidArgument(e.to_string()))
    }

    /// Place the image file at `path` with its top-left corner in cell (`row`, `col`).
    pub fn insert_image<P: AsRef<Path>>(&mut self, row: u32, col: u32, path: P) -> Result<MediaId> {
        let sheet = self.workbook.active_sheet_index();
        self.workbook.insert_image_file(sheet, row, col, path, None)
    }

    /// Add an empty chart of `width` x `height` pixels at cell (`row`, `col`).
    pub fn insert_chart(&mut self, row: u32, col: u32, width: u32, height: u32) -> Result<ChartId> {
        let sheet = self.workbook.active_sheet_index();
        self.workbook.insert_chart(sheet, row, col, width, height)
    }

    /// Define a workbook-scoped name.
    pub fn define_name(&mut self, name: &str, formula: &str) -> Result<()> {
        self.workbook.define_name(name, formula, None, None)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::media::tests::png_header;
    use std::io::Cursor;

    #[test]
    fn test_new_document() {
        let doc = Document::new();
        assert_eq!(doc.sheet_names(), vec!["Sheet1"]);
        assert_eq!(doc.path(), Path::new("Book1.xlsx"));
        assert!(doc.property_names().is_empty());
    }

    #[test]
    fn test_save_as_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut doc = Document::new();
        doc.write(1, 1, "Name").unwrap();
        doc.write(1, 2, 3.25).unwrap();
        doc.add_sheet(Some("Summary")).unwrap();
        doc.write(2, 2, true).unwrap();
        doc.set_property("creator", "Finance");
        doc.save_as(&path).unwrap();
        assert_eq!(doc.path(), path.as_path());

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.sheet_names(), vec!["Sheet1", "Summary"]);
        assert_eq!(reopened.property("creator"), Some("Finance"));
        assert_eq!(reopened.read(2, 2), Some(&CellValue::Bool(true)));
        assert_eq!(reopened.path(), path.as_path());

        let first = reopened.workbook().sheet("Sheet1").unwrap().as_worksheet().unwrap();
        assert_eq!(first.value(1, 1), Some(&CellValue::String("Name".to_string())));
        assert_eq!(first.value(1, 2), Some(&CellValue::Number(3.25)));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();

        let mut doc = Document::new();
        doc.save_as(&path).unwrap();
        doc.write(1, 1, 9.0).unwrap();
        doc.save().unwrap();

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.read(1, 1), Some(&CellValue::Number(9.0)));
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut doc = Document::new();
        doc.rename_sheet("Sheet1", "Kept").unwrap();
        doc.write(1, 1, 1.0).unwrap();

        assert!(doc.load_from_reader(Cursor::new(b"garbage".to_vec())).is_err());

        let mut buffer = Vec::new();
        Document::new().save_to_writer(&mut buffer).unwrap();
        // Cut the archive short so the central directory is gone.
        buffer.truncate(buffer.len() / 2);
        assert!(doc.load_from_reader(Cursor::new(buffer)).is_err());

        assert_eq!(doc.sheet_names(), vec!["Kept"]);
        assert_eq!(doc.read(1, 1), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_stream_round_trip() {
        let mut doc = Document::new();
        doc.add_chartsheet(None).unwrap();
        doc.select_sheet("Sheet1").unwrap();
        doc.define_name("Origin", "Sheet1!$A$1").unwrap();
        doc.insert_chart(3, 3, 400, 300).unwrap();

        let mut buffer = Vec::new();
        doc.save_to_writer(&mut buffer).unwrap();
        let loaded = Document::from_reader(Cursor::new(buffer)).unwrap();

        assert_eq!(loaded.sheet_names(), vec!["Sheet1", "Chart2"]);
        assert_eq!(loaded.workbook().defined_names()[0].name, "Origin");
        assert_eq!(loaded.workbook().charts().len(), 2);
        assert_eq!(loaded.workbook().drawings().len(), 2);
    }

    #[test]
    fn test_cells_need_a_worksheet() {
        let mut doc = Document::new();
        doc.add_chartsheet(Some("Plot")).unwrap();
        assert_eq!(doc.read(1, 1), None);
        assert!(matches!(doc.write(1, 1, 1.0), Err(OoxmlError::InvalidArgument(_))));

        doc.select_sheet("Sheet1").unwrap();
        assert!(matches!(doc.write(0, 1, 1.0), Err(OoxmlError::InvalidArgument(_))));
        doc.write(1, 1, 1.0).unwrap();
    }

    #[test]
    fn test_insert_image_on_active_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("dot.png");
        std::fs::write(&image, png_header(1, 1)).unwrap();

        let mut doc = Document::new();
        doc.add_sheet(None).unwrap();
        doc.insert_image(2, 2, &image).unwrap();

        let second = doc.workbook().sheet("Sheet2").unwrap();
        assert!(second.drawing().is_some());
        assert!(doc.workbook().sheet("Sheet1").unwrap().drawing().is_none());
    }
}
