//! The workbook part graph.
//!
//! A [`Workbook`] owns every part of a spreadsheet package other than the document
//! properties: the ordered sheet list, the drawings, and the workbook-wide media and
//! chart arenas, external links, styles, shared strings and theme. Positions in these
//! collections are what the package writer turns into `sheet{N}.xml`,
//! `drawing{N}.xml`, `chart{N}.xml` and `image{N}.{ext}` names.
use crate::ooxml::common::xml::{XML_DECLARATION, attr_value, escape_xml, parse_bool, parse_i64, u32_attr};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::Result as OpcResult;
use crate::ooxml::xlsx::anchor::{AnchorGeometry, DrawingObject, Extent, Marker, Position};
use crate::ooxml::xlsx::cell::{MAX_COLUMNS, MAX_ROWS};
use crate::ooxml::xlsx::chart::{Chart, ChartCollection, ChartId};
use crate::ooxml::xlsx::chartsheet::Chartsheet;
use crate::ooxml::xlsx::drawing::{Drawing, DrawingId};
use crate::ooxml::xlsx::external_link::ExternalLink;
use crate::ooxml::xlsx::media::{MediaCollection, MediaFile, MediaId, image_size, sniff_suffix};
use crate::ooxml::xlsx::ole::OleObject;
use crate::ooxml::xlsx::shared_strings::SharedStrings;
use crate::ooxml::xlsx::sheet::{Sheet, SheetKind, SheetState, is_valid_sheet_name};
use crate::ooxml::xlsx::styles::Styles;
use crate::ooxml::xlsx::theme::Theme;
use crate::ooxml::xlsx::worksheet::Worksheet;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashSet;
use std::path::Path;

/// Extent of the chart on a new chart sheet, in EMU.
const CHARTSHEET_EXTENT: Extent = Extent {
    cx: 9_293_679,
    cy: 6_068_786,
};

/// First legacy shape id handed to embedded objects.
const FIRST_OLE_SHAPE_ID: u32 = 1025;

/// Which kind of sheet to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetType {
    Worksheet,
    Chartsheet,
}

/// Named formula or range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Formula text without the leading `=`
    pub formula: String,
    pub comment: Option<String>,
    /// Index of the sheet the name is local to; `None` for workbook scope
    pub local_sheet_id: Option<usize>,
    pub hidden: bool,
}

/// Sheet entry of `workbook.xml` before its relationship is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub state: SheetState,
    pub r_id: String,
}

/// Everything `workbook.xml` declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WorkbookXml {
    pub sheets: Vec<SheetEntry>,
    pub external_links: Vec<String>,
    pub defined_names: Vec<DefinedName>,
    pub date1904: bool,
    pub active_tab: usize,
}

#[derive(Debug, Clone)]
pub struct Workbook {
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) active_sheet: usize,
    pub(crate) drawings: Vec<Drawing>,
    pub(crate) media: MediaCollection,
    pub(crate) charts: ChartCollection,
    pub(crate) external_links: Vec<ExternalLink>,
    pub(crate) styles: Styles,
    pub(crate) shared_strings: SharedStrings,
    pub(crate) theme: Theme,
    pub(crate) defined_names: Vec<DefinedName>,
    pub(crate) date1904: bool,
}

impl Workbook {
    /// A workbook with one empty worksheet named `Sheet1`.
    pub fn new() -> Self {
        let mut workbook = Self::empty();
        workbook.sheets.push(Sheet {
            name: "Sheet1".to_string(),
            sheet_id: 1,
            state: SheetState::Visible,
            kind: SheetKind::Worksheet(Worksheet::new()),
        });
        workbook
    }

    /// A workbook with no sheets, default styles and theme. Loading starts here.
    pub(crate) fn empty() -> Self {
        Self {
            sheets: Vec::new(),
            active_sheet: 0,
            drawings: Vec::new(),
            media: MediaCollection::new(),
            charts: ChartCollection::new(),
            external_links: Vec::new(),
            styles: Styles::default(),
            shared_strings: SharedStrings::new(),
            theme: Theme::default(),
            defined_names: Vec::new(),
            date1904: false,
        }
    }

    // ---- sheets -------------------------------------------------------------

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_sheet)
    }

    pub fn active_sheet_mut(&mut self) -> Option<&mut Sheet> {
        self.sheets.get_mut(self.active_sheet)
    }

    /// Make the sheet named `name` the active one.
    pub fn set_active_sheet(&mut self, name: &str) -> Result<()> {
        self.active_sheet = self.require_sheet(name)?;
        Ok(())
    }

    /// Append a sheet; see [`Workbook::insert_sheet`].
    pub fn add_sheet(&mut self, name: Option<&str>, sheet_type: SheetType) -> Result<usize> {
        self.insert_sheet(self.sheets.len(), name, sheet_type)
    }

    /// Insert a sheet at `index` (clamped to the sheet count) and make it active.
    ///
    /// Without a name the first free `Sheet{N}` or `Chart{N}` is used. A chart sheet
    /// gets an empty chart on a drawing of its own.
    pub fn insert_sheet(&mut self, index: usize, name: Option<&str>, sheet_type: SheetType) -> Result<usize> {
        let name = match name {
            Some(name) => {
                self.check_new_name(name, None)?;
                name.to_string()
            },
            None => self.unused_name(sheet_type),
        };

        let kind = match sheet_type {
            SheetType::Worksheet => SheetKind::Worksheet(Worksheet::new()),
            SheetType::Chartsheet => {
                let chart = self.charts.add(Chart::new());
                let mut drawing = Drawing::new();
                drawing.add_anchor(
                    AnchorGeometry::Absolute {
                        pos: Position::default(),
                        ext: CHARTSHEET_EXTENT,
                    },
                    DrawingObject::GraphicFrame(chart),
                );
                let drawing_id = DrawingId(self.drawings.len());
                self.drawings.push(drawing);
                let mut chartsheet = Chartsheet::new();
                chartsheet.set_drawing(Some(drawing_id));
                SheetKind::Chartsheet(chartsheet)
            },
        };

        let index = index.min(self.sheets.len());
        let sheet_id = self.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        self.sheets.insert(
            index,
            Sheet {
                name,
                sheet_id,
                state: SheetState::Visible,
                kind,
            },
        );
        for defined in &mut self.defined_names {
            if let Some(local) = defined.local_sheet_id.as_mut()
                && *local >= index
            {
                *local += 1;
            }
        }
        self.active_sheet = index;
        Ok(index)
    }

    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let index = self.require_sheet(old_name)?;
        self.check_new_name(new_name, Some(index))?;
        self.sheets[index].name = new_name.to_string();
        Ok(())
    }

    /// Append a copy of a worksheet's cells under `new_name`.
    pub fn copy_sheet(&mut self, source: &str, new_name: &str) -> Result<usize> {
        let index = self.require_sheet(source)?;
        self.check_new_name(new_name, None)?;
        let worksheet = self.sheets[index]
            .as_worksheet()
            .map(Worksheet::copy_cells)
            .ok_or_else(|| OoxmlError::InvalidArgument(format!("'{}' is not a worksheet", source)))?;

        let sheet_id = self.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        self.sheets.push(Sheet {
            name: new_name.to_string(),
            sheet_id,
            state: SheetState::Visible,
            kind: SheetKind::Worksheet(worksheet),
        });
        Ok(self.sheets.len() - 1)
    }

    /// Move a sheet to position `index` (clamped). The active sheet stays the same sheet.
    pub fn move_sheet(&mut self, name: &str, index: usize) -> Result<()> {
        let from = self.require_sheet(name)?;
        let to = index.min(self.sheets.len() - 1);
        if from == to {
            return Ok(());
        }

        let remap = |i: usize| -> usize {
            if i == from {
                to
            } else if from < to && i > from && i <= to {
                i - 1
            } else if to < from && i >= to && i < from {
                i + 1
            } else {
                i
            }
        };
        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);
        self.active_sheet = remap(self.active_sheet);
        for defined in &mut self.defined_names {
            if let Some(local) = defined.local_sheet_id.as_mut() {
                *local = remap(*local);
            }
        }
        Ok(())
    }

    /// Delete a sheet. The last sheet cannot be deleted.
    ///
    /// The sheet's drawing goes with it unless another sheet shares it. Charts and
    /// media no drawing references any more are dropped and the rest renumbered.
    pub fn delete_sheet(&mut self, name: &str) -> Result<()> {
        let index = self.require_sheet(name)?;
        if self.sheets.len() == 1 {
            return Err(OoxmlError::InvalidArgument(
                "a workbook must keep at least one sheet".to_string(),
            ));
        }

        let removed = self.sheets.remove(index);
        if let Some(drawing) = removed.drawing()
            && !self.sheets.iter().any(|s| s.drawing() == Some(drawing))
        {
            self.drawings.remove(drawing.0);
            for sheet in &mut self.sheets {
                if let Some(other) = sheet.drawing()
                    && other.0 > drawing.0
                {
                    sheet.set_drawing(Some(DrawingId(other.0 - 1)));
                }
            }
            self.prune_objects();
        }

        self.defined_names.retain(|d| d.local_sheet_id != Some(index));
        for defined in &mut self.defined_names {
            if let Some(local) = defined.local_sheet_id.as_mut()
                && *local > index
            {
                *local -= 1;
            }
        }
        if self.active_sheet > index || self.active_sheet >= self.sheets.len() {
            self.active_sheet = self.active_sheet.saturating_sub(1);
        }
        Ok(())
    }

    /// Drop charts and media that no drawing references, keeping part numbers dense.
    fn prune_objects(&mut self) {
        let mut used_media = HashSet::new();
        let mut used_charts = HashSet::new();
        for anchor in self.drawings.iter().flat_map(Drawing::anchors) {
            match anchor.object() {
                DrawingObject::Picture(id) => {
                    used_media.insert(*id);
                },
                DrawingObject::GraphicFrame(id) => {
                    used_charts.insert(*id);
                },
                _ => {},
            }
        }
        if used_media.len() == self.media.len() && used_charts.len() == self.charts.len() {
            return;
        }

        let media = self.media.compact(&used_media);
        let charts = self.charts.compact(&used_charts);
        debug!(media = self.media.len(), charts = self.charts.len(); "pruned unreferenced drawing objects");
        for drawing in &mut self.drawings {
            drawing.remap_objects(&media, &charts);
        }
    }

    fn require_sheet(&self, name: &str) -> Result<usize> {
        self.sheet_index(name)
            .ok_or_else(|| OoxmlError::InvalidArgument(format!("no sheet named '{}'", name)))
    }

    /// Reject invalid names and names already used by another sheet (case-insensitive).
    fn check_new_name(&self, name: &str, except: Option<usize>) -> Result<()> {
        if !is_valid_sheet_name(name) {
            return Err(OoxmlError::InvalidArgument(format!("invalid sheet name '{}'", name)));
        }
        let lowered = name.to_lowercase();
        let taken = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != except && s.name.to_lowercase() == lowered);
        if taken {
            return Err(OoxmlError::InvalidArgument(format!("sheet '{}' already exists", name)));
        }
        Ok(())
    }

    fn unused_name(&self, sheet_type: SheetType) -> String {
        let prefix = match sheet_type {
            SheetType::Worksheet => "Sheet",
            SheetType::Chartsheet => "Chart",
        };
        (self.sheets.len() + 1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|candidate| self.check_new_name(candidate, None).is_ok())
            .unwrap_or_else(|| prefix.to_string())
    }

    fn worksheet_mut(&mut self, sheet: usize) -> Result<&mut Worksheet> {
        self.sheets
            .get_mut(sheet)
            .and_then(Sheet::as_worksheet_mut)
            .ok_or_else(|| OoxmlError::InvalidArgument(format!("sheet {} is not a worksheet", sheet)))
    }

    // ---- drawings -----------------------------------------------------------

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn drawing(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.get(id.0)
    }

    pub fn media(&self) -> &MediaCollection {
        &self.media
    }

    pub fn charts(&self) -> &ChartCollection {
        &self.charts
    }

    /// The worksheet's drawing, created on first use.
    fn ensure_drawing(&mut self, sheet: usize) -> Result<DrawingId> {
        let next = DrawingId(self.drawings.len());
        let worksheet = self.worksheet_mut(sheet)?;
        match worksheet.drawing() {
            Some(id) => Ok(id),
            None => {
                worksheet.set_drawing(Some(next));
                self.drawings.push(Drawing::new());
                Ok(next)
            },
        }
    }

    fn one_cell_anchor(row: u32, col: u32, width: u32, height: u32) -> Result<AnchorGeometry> {
        if row == 0 || col == 0 || row > MAX_ROWS || col > MAX_COLUMNS {
            return Err(OoxmlError::InvalidArgument(format!(
                "cell ({}, {}) is outside the sheet",
                row, col
            )));
        }
        Ok(AnchorGeometry::OneCell {
            from: Marker::new(row - 1, col - 1),
            ext: Extent::from_pixels(width as i64, height as i64),
        })
    }

    /// Place a picture with its top-left corner in cell (`row`, `col`), both 1-based.
    ///
    /// The format is sniffed from the bytes (PNG, JPEG, GIF or BMP). Without an explicit
    /// `size` in pixels the image's own size is used.
    pub fn insert_image(
        &mut self,
        sheet: usize,
        row: u32,
        col: u32,
        data: Vec<u8>,
        size: Option<(u32, u32)>,
    ) -> Result<MediaId> {
        let suffix = sniff_suffix(&data)
            .ok_or_else(|| OoxmlError::InvalidArgument("unrecognized image format".to_string()))?;
        self.place_image(sheet, row, col, MediaFile::new(data, suffix), size)
    }

    /// Like [`Workbook::insert_image`], reading the file at `path`. Inserting the same
    /// file twice shares one media entry.
    pub fn insert_image_file<P: AsRef<Path>>(
        &mut self,
        sheet: usize,
        row: u32,
        col: u32,
        path: P,
        size: Option<(u32, u32)>,
    ) -> Result<MediaId> {
        let canonical = path.as_ref().canonicalize()?;
        let data = std::fs::read(&canonical)?;
        let suffix = sniff_suffix(&data)
            .map(str::to_string)
            .or_else(|| canonical.extension().map(|e| e.to_string_lossy().to_lowercase()))
            .ok_or_else(|| OoxmlError::InvalidArgument(format!("unrecognized image {}", canonical.display())))?;
        let file = MediaFile::new(data, &suffix).with_source(canonical.to_string_lossy());
        self.place_image(sheet, row, col, file, size)
    }

    fn place_image(
        &mut self,
        sheet: usize,
        row: u32,
        col: u32,
        file: MediaFile,
        size: Option<(u32, u32)>,
    ) -> Result<MediaId> {
        let (width, height) = size
            .or_else(|| image_size(file.content()))
            .ok_or_else(|| OoxmlError::InvalidArgument("image size is unknown".to_string()))?;
        let geometry = Self::one_cell_anchor(row, col, width, height)?;
        let drawing = self.ensure_drawing(sheet)?;
        let media = self.media.add(file);
        self.drawings[drawing.0].add_anchor(geometry, DrawingObject::Picture(media));
        Ok(media)
    }

    /// Add an empty chart of `width` x `height` pixels at cell (`row`, `col`), 1-based.
    pub fn insert_chart(&mut self, sheet: usize, row: u32, col: u32, width: u32, height: u32) -> Result<ChartId> {
        let geometry = Self::one_cell_anchor(row, col, width, height)?;
        let drawing = self.ensure_drawing(sheet)?;
        let chart = self.charts.add(Chart::new());
        self.drawings[drawing.0].add_anchor(geometry, DrawingObject::GraphicFrame(chart));
        Ok(chart)
    }

    /// Embed a file in a worksheet under `xl/embeddings/{file_name}`.
    ///
    /// File names are unique across the workbook.
    pub fn insert_ole_object(
        &mut self,
        sheet: usize,
        file_name: &str,
        prog_id: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(OoxmlError::InvalidArgument(format!("invalid embedding name '{}'", file_name)));
        }
        let existing: Vec<&OleObject> = self
            .sheets
            .iter()
            .filter_map(Sheet::as_worksheet)
            .flat_map(|ws| ws.ole_objects())
            .collect();
        if existing.iter().any(|o| o.file_name() == file_name) {
            return Err(OoxmlError::InvalidArgument(format!("embedding '{}' already exists", file_name)));
        }
        let shape_id = existing
            .iter()
            .map(|o| o.shape_id())
            .max()
            .map_or(FIRST_OLE_SHAPE_ID, |id| id.max(FIRST_OLE_SHAPE_ID - 1) + 1);

        let object = OleObject::new(file_name, prog_id, content, content_type).with_shape_id(shape_id);
        self.worksheet_mut(sheet)?.ole_objects_mut().push(object);
        Ok(())
    }

    // ---- workbook-level settings ------------------------------------------

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn external_links(&self) -> &[ExternalLink] {
        &self.external_links
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Define a name, replacing one with the same name and scope. `scope` is the name
    /// of the sheet the name is local to.
    pub fn define_name(&mut self, name: &str, formula: &str, comment: Option<&str>, scope: Option<&str>) -> Result<()> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(OoxmlError::InvalidArgument(format!("invalid defined name '{}'", name)));
        }
        let local_sheet_id = scope.map(|s| self.require_sheet(s)).transpose()?;
        let defined = DefinedName {
            name: name.to_string(),
            formula: formula.trim_start_matches('=').to_string(),
            comment: comment.map(str::to_string),
            local_sheet_id,
            hidden: false,
        };
        match self
            .defined_names
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(name) && d.local_sheet_id == local_sheet_id)
        {
            Some(existing) => *existing = defined,
            None => self.defined_names.push(defined),
        }
        Ok(())
    }

    pub fn date1904(&self) -> bool {
        self.date1904
    }

    pub fn set_date1904(&mut self, date1904: bool) {
        self.date1904 = date1904;
    }

    // ---- workbook.xml -------------------------------------------------------

    /// Parse `xl/workbook.xml`.
    pub(crate) fn parse_xml(xml: &[u8]) -> OpcResult<WorkbookXml> {
        let mut parsed = WorkbookXml::default();
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut pending_name: Option<DefinedName> = None;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            let is_empty = matches!(event, Event::Empty(_));
            match event {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"sheet" => {
                        let name = attr_value(&e, b"name")?.unwrap_or_default();
                        let r_id = attr_value(&e, b"id")?.unwrap_or_default();
                        let sheet_id = u32_attr(&e, b"sheetId")?.unwrap_or(0);
                        let state = attr_value(&e, b"state")?
                            .map(|s| SheetState::parse(&s))
                            .unwrap_or_default();
                        parsed.sheets.push(SheetEntry {
                            name,
                            sheet_id,
                            state,
                            r_id,
                        });
                    },
                    b"workbookPr" => {
                        parsed.date1904 = attr_value(&e, b"date1904")?.as_deref().is_some_and(parse_bool);
                    },
                    b"workbookView" => {
                        if let Some(tab) = attr_value(&e, b"activeTab")?.as_deref().and_then(parse_i64) {
                            parsed.active_tab = tab.max(0) as usize;
                        }
                    },
                    b"externalReference" => {
                        if let Some(r_id) = attr_value(&e, b"id")? {
                            parsed.external_links.push(r_id);
                        }
                    },
                    b"definedName" => {
                        let defined = DefinedName {
                            name: attr_value(&e, b"name")?.unwrap_or_default(),
                            formula: String::new(),
                            comment: attr_value(&e, b"comment")?,
                            local_sheet_id: attr_value(&e, b"localSheetId")?
                                .as_deref()
                                .and_then(parse_i64)
                                .map(|i| i.max(0) as usize),
                            hidden: attr_value(&e, b"hidden")?.as_deref().is_some_and(parse_bool),
                        };
                        if is_empty {
                            parsed.defined_names.push(defined);
                        } else {
                            pending_name = Some(defined);
                        }
                    },
                    _ => {},
                },
                Event::Text(t) => {
                    if let Some(defined) = pending_name.as_mut() {
                        defined.formula.push_str(&t.unescape()?);
                    }
                },
                Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                    if let Some(defined) = pending_name.take() {
                        parsed.defined_names.push(defined);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(parsed)
    }

    /// Serialize `xl/workbook.xml`. `sheet_rids` holds one id per sheet in sheet order,
    /// `link_rids` one per external link.
    pub(crate) fn to_xml(&self, sheet_rids: &[String], link_rids: &[String]) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<workbook xmlns="{}" xmlns:r="{}">"#,
            namespace::SML_MAIN,
            namespace::OFC_RELATIONSHIPS
        ));

        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        } else {
            xml.push_str("<workbookPr/>");
        }
        xml.push_str(&format!(
            r#"<bookViews><workbookView activeTab="{}"/></bookViews>"#,
            self.active_sheet
        ));

        xml.push_str("<sheets>");
        for (sheet, r_id) in self.sheets.iter().zip(sheet_rids) {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}""#,
                escape_xml(&sheet.name),
                sheet.sheet_id
            ));
            if sheet.state != SheetState::Visible {
                xml.push_str(&format!(r#" state="{}""#, sheet.state.as_str()));
            }
            xml.push_str(&format!(r#" r:id="{}"/>"#, r_id));
        }
        xml.push_str("</sheets>");

        if !link_rids.is_empty() {
            xml.push_str("<externalReferences>");
            for r_id in link_rids {
                xml.push_str(&format!(r#"<externalReference r:id="{}"/>"#, r_id));
            }
            xml.push_str("</externalReferences>");
        }

        if !self.defined_names.is_empty() {
            xml.push_str("<definedNames>");
            for defined in &self.defined_names {
                xml.push_str(&format!(r#"<definedName name="{}""#, escape_xml(&defined.name)));
                if let Some(comment) = &defined.comment {
                    xml.push_str(&format!(r#" comment="{}""#, escape_xml(comment)));
                }
                if let Some(local) = defined.local_sheet_id {
                    xml.push_str(&format!(r#" localSheetId="{}""#, local));
                }
                if defined.hidden {
                    xml.push_str(r#" hidden="1""#);
                }
                xml.push_str(&format!(">{}</definedName>", escape_xml(&defined.formula)));
            }
            xml.push_str("</definedNames>");
        }

        xml.push_str(r#"<calcPr calcId="124519" fullCalcOnLoad="1"/>"#);
        xml.push_str("</workbook>");
        xml
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
