//! Load and save orchestration for spreadsheet packages.
//!
//! Loading follows the relationship graph from `_rels/.rels` to the workbook and out to
//! sheets, external links, drawings, charts, media and embeddings, building a new
//! [`Workbook`] off to the side. Nothing is handed back unless every mandatory step
//! succeeded.
//!
//! Saving rebuilds every relationship graph and content type override from the
//! workbook's current state. Part numbers are arena positions, read once when a
//! relationship target is minted and again when the entry is written.
use crate::ooxml::common::properties::DocumentProperties;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{category, content_type as ct, relationship_type as rt};
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result as OpcResult};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::xlsx::anchor::LoadContext;
use crate::ooxml::xlsx::chart::Chart;
use crate::ooxml::xlsx::chartsheet::Chartsheet;
use crate::ooxml::xlsx::drawing::{Drawing, DrawingId};
use crate::ooxml::xlsx::external_link::ExternalLink;
use crate::ooxml::xlsx::ole::OleObject;
use crate::ooxml::xlsx::shared_strings::SharedStrings;
use crate::ooxml::xlsx::sheet::{Sheet, SheetKind};
use crate::ooxml::xlsx::styles::Styles;
use crate::ooxml::xlsx::theme::Theme;
use crate::ooxml::xlsx::workbook::Workbook;
use crate::ooxml::xlsx::worksheet::{Worksheet, WorksheetRefs};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

const WORKBOOK_URI: &str = "/xl/workbook.xml";
const STYLES_URI: &str = "/xl/styles.xml";
const SHARED_STRINGS_URI: &str = "/xl/sharedStrings.xml";
const THEME_URI: &str = "/xl/theme/theme1.xml";
const CORE_PROPERTIES_URI: &str = "/docProps/core.xml";
const APP_PROPERTIES_URI: &str = "/docProps/app.xml";

/// Result of a successful load.
#[derive(Debug)]
pub(crate) struct LoadedPackage {
    pub workbook: Workbook,
    pub properties: DocumentProperties,
    /// Registry as read, so its defaults can be carried into the next save
    pub content_types: ContentTypes,
}

/// Read a whole spreadsheet package.
pub(crate) fn load(phys: PhysPkgReader) -> Result<LoadedPackage> {
    let reader = PackageReader::new(phys).map_err(package_table_error)?;

    let mut properties = DocumentProperties::new();
    load_properties(&reader, &mut properties);

    let office = reader
        .pkg_rels()
        .first_by_category(category::OFFICE_DOCUMENT)
        .filter(|rel| !rel.is_external())
        .ok_or_else(|| OoxmlError::Format("package has no officeDocument relationship".to_string()))?;
    let workbook_uri = office.target_partname()?;

    let workbook = WorkbookLoader::new(&reader).load(&workbook_uri)?;
    debug!(
        sheets = workbook.sheets.len(),
        drawings = workbook.drawings.len(),
        charts = workbook.charts.len(),
        media = workbook.media.len();
        "package loaded"
    );

    Ok(LoadedPackage {
        workbook,
        properties,
        content_types: reader.into_content_types(),
    })
}

/// A missing package table is a format error; a malformed one a parse error.
fn package_table_error(err: OpcError) -> OoxmlError {
    match err {
        OpcError::PartNotFound(path) => OoxmlError::Format(format!("package has no {}", path)),
        OpcError::XmlError(message) => match message.split_once(": ") {
            Some((part, detail)) => OoxmlError::parse(part, detail),
            None => OoxmlError::parse(CONTENT_TYPES_URI, message),
        },
        other => OoxmlError::Opc(other),
    }
}

/// Bytes of a part the load cannot do without.
fn mandatory_blob<'r>(reader: &'r PackageReader, partname: &PackURI) -> Result<&'r [u8]> {
    reader.blob_for(partname).map_err(|err| match err {
        OpcError::PartNotFound(path) => OoxmlError::Format(format!("missing part {}", path)),
        other => OoxmlError::in_part(partname.as_str(), other),
    })
}

/// Relationships of a part, treating a malformed `.rels` entry as absent.
fn optional_rels(reader: &PackageReader, partname: &PackURI) -> Option<Relationships> {
    match reader.rels_for(partname) {
        Ok(rels) => rels,
        Err(e) => {
            warn!(part = partname.as_str(); "ignoring unreadable relationships: {}", e);
            None
        },
    }
}

fn load_properties(reader: &PackageReader, properties: &mut DocumentProperties) {
    type Loader = fn(&mut DocumentProperties, &[u8]) -> OpcResult<()>;
    let sources: [(&str, Loader); 2] = [
        (category::CORE_PROPERTIES, DocumentProperties::load_core_xml),
        (category::EXTENDED_PROPERTIES, DocumentProperties::load_app_xml),
    ];

    for (category, load) in sources {
        let Some(rel) = reader.pkg_rels().first_by_category(category) else {
            continue;
        };
        if rel.is_external() {
            continue;
        }
        let result = rel
            .target_partname()
            .and_then(|partname| load(properties, reader.blob_for(&partname)?));
        if let Err(e) = result {
            warn!(category = category; "ignoring document properties: {}", e);
        }
    }
}

/// Load an optional workbook-level part; failures are logged and yield `None`.
fn optional_part<T>(
    reader: &PackageReader,
    rels: &Relationships,
    category: &str,
    load: impl FnOnce(&[u8]) -> OpcResult<T>,
) -> Option<T> {
    let rel = rels.first_by_category(category).filter(|rel| !rel.is_external())?;
    let result = rel
        .target_partname()
        .and_then(|partname| load(reader.blob_for(&partname)?));
    match result {
        Ok(part) => Some(part),
        Err(e) => {
            warn!(category = category, target = rel.target_ref(); "using default part: {}", e);
            None
        },
    }
}

/// An embedded object whose bytes are fetched once every sheet is parsed.
struct PendingOle {
    sheet: usize,
    object: usize,
    partname: PackURI,
}

/// Walks one package into a new [`Workbook`].
struct WorkbookLoader<'r> {
    reader: &'r PackageReader,
    workbook: Workbook,
    drawing_parts: Vec<PackURI>,
    drawing_ids: HashMap<PackURI, DrawingId>,
    pending_ole: Vec<PendingOle>,
    /// Embedding name handed out for each source part
    embedding_names: HashMap<String, PackURI>,
}

impl<'r> WorkbookLoader<'r> {
    fn new(reader: &'r PackageReader) -> Self {
        Self {
            reader,
            workbook: Workbook::empty(),
            drawing_parts: Vec::new(),
            drawing_ids: HashMap::new(),
            pending_ole: Vec::new(),
            embedding_names: HashMap::new(),
        }
    }

    fn load(mut self, workbook_uri: &PackURI) -> Result<Workbook> {
        let reader = self.reader;
        let workbook_rels = reader
            .rels_for(workbook_uri)
            .map_err(|e| OoxmlError::in_part(workbook_uri.rels_uri().as_str(), e))?
            .unwrap_or_else(|| Relationships::new(workbook_uri.base_uri()));
        let parsed = Workbook::parse_xml(mandatory_blob(reader, workbook_uri)?)
            .map_err(|e| OoxmlError::in_part(workbook_uri.as_str(), e))?;

        if let Some(styles) = optional_part(reader, &workbook_rels, category::STYLES, |xml| Styles::load(xml.to_vec())) {
            self.workbook.styles = styles;
        }
        if let Some(strings) = optional_part(reader, &workbook_rels, category::SHARED_STRINGS, SharedStrings::from_xml) {
            self.workbook.shared_strings = strings;
        }
        if let Some(theme) = optional_part(reader, &workbook_rels, category::THEME, |xml| Theme::load(xml.to_vec())) {
            self.workbook.theme = theme;
        }

        // Position of each declared sheet in the loaded workbook; None when skipped
        let mut positions = Vec::with_capacity(parsed.sheets.len());
        for entry in &parsed.sheets {
            let rel = workbook_rels
                .relationship_by_id(&entry.r_id)
                .filter(|rel| !rel.is_external())
                .ok_or_else(|| {
                    OoxmlError::Format(format!("sheet '{}' has no part for {}", entry.name, entry.r_id))
                })?;
            let partname = rel.target_partname()?;

            let kind = if rel.matches_category(category::WORKSHEET) {
                SheetKind::Worksheet(self.load_worksheet(&partname)?)
            } else if rel.matches_category(category::CHARTSHEET) {
                SheetKind::Chartsheet(self.load_chartsheet(&partname)?)
            } else {
                warn!(sheet = entry.name.as_str(), reltype = rel.reltype(); "skipping unsupported sheet type");
                positions.push(None);
                continue;
            };

            positions.push(Some(self.workbook.sheets.len()));
            self.workbook.sheets.push(Sheet {
                name: entry.name.clone(),
                sheet_id: entry.sheet_id,
                state: entry.state,
                kind,
            });
        }
        if self.workbook.sheets.is_empty() {
            return Err(OoxmlError::Format("workbook has no sheets".to_string()));
        }

        for r_id in &parsed.external_links {
            self.load_external_link(&workbook_rels, r_id)?;
        }
        self.load_drawings()?;
        self.load_charts();
        self.load_media()?;
        self.load_ole_content();

        let workbook = &mut self.workbook;
        workbook.date1904 = parsed.date1904;
        workbook.active_sheet = positions.get(parsed.active_tab).copied().flatten().unwrap_or(0);
        workbook.defined_names = parsed
            .defined_names
            .into_iter()
            .filter_map(|mut defined| {
                defined.local_sheet_id = match defined.local_sheet_id {
                    Some(local) => Some(positions.get(local).copied().flatten()?),
                    None => None,
                };
                Some(defined)
            })
            .collect();

        Ok(self.workbook)
    }

    fn load_worksheet(&mut self, partname: &PackURI) -> Result<Worksheet> {
        let rels = optional_rels(self.reader, partname);
        let xml = mandatory_blob(self.reader, partname)?;
        let (mut worksheet, refs) = Worksheet::from_xml(xml, &self.workbook.shared_strings)
            .map_err(|e| OoxmlError::in_part(partname.as_str(), e))?;

        let WorksheetRefs { drawing, ole_objects } = refs;
        worksheet.set_drawing(self.drawing_for(partname, rels.as_ref(), drawing.as_deref()));

        let sheet = self.workbook.sheets.len();
        for reference in ole_objects {
            let target = rels
                .as_ref()
                .and_then(|rels| rels.relationship_by_id(&reference.r_id))
                .filter(|rel| !rel.is_external())
                .map(|rel| rel.target_partname());
            let target = match target {
                Some(Ok(target)) => target,
                Some(Err(e)) => {
                    warn!(sheet = partname.as_str(), r_id = reference.r_id.as_str(); "bad embedding target: {}", e);
                    continue;
                },
                None => {
                    warn!(sheet = partname.as_str(), r_id = reference.r_id.as_str(); "embedding relationship does not resolve");
                    continue;
                },
            };

            let content_type = self.reader.content_type_for(&target);
            let name = self.embedding_name(&target);
            let object = OleObject::new(name, reference.prog_id, Vec::new(), content_type)
                .with_shape_id(reference.shape_id);
            self.pending_ole.push(PendingOle {
                sheet,
                object: worksheet.ole_objects().len(),
                partname: target,
            });
            worksheet.ole_objects_mut().push(object);
        }

        Ok(worksheet)
    }

    fn load_chartsheet(&mut self, partname: &PackURI) -> Result<Chartsheet> {
        let rels = optional_rels(self.reader, partname);
        let xml = mandatory_blob(self.reader, partname)?;
        let (mut chartsheet, drawing) =
            Chartsheet::from_xml(xml).map_err(|e| OoxmlError::in_part(partname.as_str(), e))?;
        chartsheet.set_drawing(self.drawing_for(partname, rels.as_ref(), drawing.as_deref()));
        Ok(chartsheet)
    }

    /// Queue the drawing a sheet refers to. A drawing part shared by two sheets is
    /// loaded once.
    fn drawing_for(&mut self, sheet: &PackURI, rels: Option<&Relationships>, r_id: Option<&str>) -> Option<DrawingId> {
        let r_id = r_id?;
        let rel = rels
            .and_then(|rels| rels.relationship_by_id(r_id))
            .filter(|rel| !rel.is_external() && rel.matches_category(category::DRAWING));
        let partname = match rel.map(|rel| rel.target_partname()) {
            Some(Ok(partname)) => partname,
            Some(Err(e)) => {
                warn!(sheet = sheet.as_str(), r_id = r_id; "bad drawing target: {}", e);
                return None;
            },
            None => {
                warn!(sheet = sheet.as_str(), r_id = r_id; "drawing relationship does not resolve");
                return None;
            },
        };

        if let Some(&id) = self.drawing_ids.get(&partname) {
            return Some(id);
        }
        let id = DrawingId(self.drawing_parts.len());
        self.drawing_ids.insert(partname.clone(), id);
        self.drawing_parts.push(partname);
        Some(id)
    }

    fn load_external_link(&mut self, workbook_rels: &Relationships, r_id: &str) -> Result<()> {
        let rel = workbook_rels
            .relationship_by_id(r_id)
            .filter(|rel| !rel.is_external() && rel.matches_category(category::EXTERNAL_LINK));
        let Some(rel) = rel else {
            warn!(r_id = r_id; "external link relationship does not resolve");
            return Ok(());
        };

        let partname = rel.target_partname()?;
        let rels = optional_rels(self.reader, &partname);
        let xml = mandatory_blob(self.reader, &partname)?.to_vec();
        let link = ExternalLink::load(xml, rels).map_err(|e| OoxmlError::in_part(partname.as_str(), e))?;
        self.workbook.external_links.push(link);
        Ok(())
    }

    fn load_drawings(&mut self) -> Result<()> {
        for partname in &self.drawing_parts {
            let rels = optional_rels(self.reader, partname);
            let xml = mandatory_blob(self.reader, partname)?;
            let mut ctx = LoadContext {
                drawing: partname,
                rels: rels.as_ref(),
                media: &mut self.workbook.media,
                charts: &mut self.workbook.charts,
            };
            let drawing = Drawing::from_xml(xml, &mut ctx).map_err(|e| OoxmlError::in_part(partname.as_str(), e))?;
            self.workbook.drawings.push(drawing);
        }
        Ok(())
    }

    /// Fill charts registered by drawings. An unreadable chart keeps the empty template.
    fn load_charts(&mut self) {
        let charts = &mut self.workbook.charts;
        let sources: Vec<_> = charts
            .iter()
            .filter_map(|(id, _)| charts.source(id).map(|source| (id, source.to_string())))
            .collect();

        for (id, source) in sources {
            let result = PackURI::new(source.as_str())
                .and_then(|partname| self.reader.blob_for(&partname).map(<[u8]>::to_vec))
                .and_then(Chart::load);
            match result {
                Ok(chart) => charts.fill(id, chart),
                Err(e) => warn!(chart = source.as_str(); "keeping empty chart: {}", e),
            }
        }
    }

    /// Fill media registered by drawings from the entries they name, taking the
    /// suffix from the entry actually present.
    fn load_media(&mut self) -> Result<()> {
        let sources: Vec<_> = self
            .workbook
            .media
            .iter()
            .filter_map(|(id, file)| file.source().map(|source| (id, source.to_string())))
            .collect();

        for (id, source) in sources {
            let partname = PackURI::new(source)?;
            match locate_media(self.reader, &partname) {
                Some(entry) => {
                    let content = self.reader.blob_for(&entry)?.to_vec();
                    self.workbook.media.fill(id, content, entry.ext());
                },
                None => warn!(media = partname.as_str(); "picture has no media entry"),
            }
        }
        Ok(())
    }

    /// Name under `xl/embeddings/` for a loaded embedding: its path below that folder,
    /// numbered when two different parts would collide. A part referenced twice keeps
    /// one name.
    fn embedding_name(&mut self, target: &PackURI) -> String {
        let preferred = target
            .as_str()
            .strip_prefix("/xl/embeddings/")
            .unwrap_or_else(|| target.filename());
        let mut name = preferred.to_string();
        for n in 2.. {
            match self.embedding_names.get(&name) {
                Some(source) if source != target => name = numbered_name(preferred, n),
                Some(_) => break,
                None => {
                    self.embedding_names.insert(name.clone(), target.clone());
                    break;
                },
            }
        }
        name
    }

    fn load_ole_content(&mut self) {
        for pending in &self.pending_ole {
            let object = self.workbook.sheets[pending.sheet]
                .as_worksheet_mut()
                .and_then(|ws| ws.ole_objects_mut().get_mut(pending.object));
            let Some(object) = object else {
                continue;
            };
            match self.reader.blob_for(&pending.partname) {
                Ok(content) => object.set_content(content.to_vec()),
                Err(e) => warn!(embedding = pending.partname.as_str(); "embedding has no content: {}", e),
            }
        }
    }
}

/// The archive entry holding a media part: the exact name, or failing that an entry
/// with the same name and a different extension.
fn locate_media(reader: &PackageReader, partname: &PackURI) -> Option<PackURI> {
    if reader.contains(partname) {
        return Some(partname.clone());
    }
    let member = partname.membername();
    let stem = member.rsplit_once('.').map_or(member, |(stem, _)| stem);
    reader
        .member_names()
        .find(|name| name.rsplit_once('.').is_some_and(|(s, _)| s == stem))
        .map(PackURI::from_membername)
}

/// `dir/stem.ext` becomes `dir/stem{n}.ext`.
fn numbered_name(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => format!("{}{}.{}", stem, n, ext),
        _ => format!("{}{}", name, n),
    }
}

/// Serialize a workbook and its properties into package bytes.
///
/// `content_types` is the registry of a previous load, whose defaults are kept; its
/// overrides are always rebuilt.
pub(crate) fn save(
    workbook: &Workbook,
    properties: &DocumentProperties,
    content_types: Option<&ContentTypes>,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut writer = match content_types {
        Some(types) => PackageWriter::with_content_types(types.clone()),
        None => PackageWriter::new(),
    };
    let workbook_uri = PackURI::new(WORKBOOK_URI)?;
    let workbook_base = workbook_uri.base_uri();

    // Worksheets and chart sheets are numbered separately, each in workbook order.
    let mut sheet_parts = Vec::with_capacity(workbook.sheets.len());
    let (mut worksheets, mut chartsheets) = (Vec::new(), Vec::new());
    for sheet in &workbook.sheets {
        let partname = match sheet.kind() {
            SheetKind::Worksheet(_) => {
                worksheets.push(sheet.name());
                PackURI::new(format!("/xl/worksheets/sheet{}.xml", worksheets.len()))?
            },
            SheetKind::Chartsheet(_) => {
                chartsheets.push(sheet.name());
                PackURI::new(format!("/xl/chartsheets/sheet{}.xml", chartsheets.len()))?
            },
        };
        sheet_parts.push(partname);
    }

    let mut workbook_rels = Relationships::new(workbook_base);
    let sheet_rids: Vec<String> = workbook
        .sheets
        .iter()
        .zip(&sheet_parts)
        .map(|(sheet, partname)| {
            let reltype = if sheet.is_worksheet() { rt::WORKSHEET } else { rt::CHARTSHEET };
            workbook_rels.add_relationship(reltype, &partname.relative_ref(workbook_base), false)
        })
        .collect();

    let mut strings = SharedStrings::new();
    let mut string_refs = 0;
    let worksheets_first = workbook
        .sheets
        .iter()
        .enumerate()
        .filter(|(_, sheet)| sheet.is_worksheet())
        .chain(workbook.sheets.iter().enumerate().filter(|(_, sheet)| !sheet.is_worksheet()));
    for (index, sheet) in worksheets_first {
        let partname = &sheet_parts[index];
        let base = partname.base_uri();
        let selected = index == workbook.active_sheet;
        let mut rels = Relationships::new(base);
        let drawing_rid = match sheet.drawing() {
            Some(drawing) => Some(rels.add_relationship(rt::DRAWING, &drawing.partname()?.relative_ref(base), false)),
            None => None,
        };

        match sheet.kind() {
            SheetKind::Worksheet(worksheet) => {
                let mut ole_rids = Vec::with_capacity(worksheet.ole_objects().len());
                for object in worksheet.ole_objects() {
                    let target = object.partname()?.relative_ref(base);
                    ole_rids.push(rels.add_relationship(object.reltype(), &target, false));
                }
                let xml = worksheet.to_xml(&mut strings, drawing_rid.as_deref(), &ole_rids, selected)?;
                string_refs += worksheet.shared_string_count();
                writer.add_xml(partname, ct::SML_WORKSHEET, xml);
            },
            SheetKind::Chartsheet(chartsheet) => {
                writer.add_xml(partname, ct::SML_CHARTSHEET, chartsheet.to_xml(drawing_rid.as_deref(), selected));
            },
        }
        writer.add_rels(partname, &rels)?;
    }

    let mut link_rids = Vec::with_capacity(workbook.external_links.len());
    for (index, link) in workbook.external_links.iter().enumerate() {
        let partname = ExternalLink::partname(index)?;
        link_rids.push(workbook_rels.add_relationship(rt::EXTERNAL_LINK, &partname.relative_ref(workbook_base), false));
        writer.add_part(&partname, link.part());
        writer.add_rels(&partname, link.rels())?;
    }

    let styles_uri = PackURI::new(STYLES_URI)?;
    let theme_uri = PackURI::new(THEME_URI)?;
    let strings_uri = PackURI::new(SHARED_STRINGS_URI)?;
    workbook_rels.add_relationship(rt::THEME, &theme_uri.relative_ref(workbook_base), false);
    workbook_rels.add_relationship(rt::STYLES, &styles_uri.relative_ref(workbook_base), false);
    if !strings.is_empty() {
        workbook_rels.add_relationship(rt::SHARED_STRINGS, &strings_uri.relative_ref(workbook_base), false);
    }
    writer.add_xml(&workbook_uri, ct::SML_SHEET_MAIN, workbook.to_xml(&sheet_rids, &link_rids));
    writer.add_rels(&workbook_uri, &workbook_rels)?;

    for (index, drawing) in workbook.drawings.iter().enumerate() {
        let partname = DrawingId(index).partname()?;
        let mut rels = Relationships::new(partname.base_uri());
        let xml = drawing.to_xml(&mut rels, &workbook.media, &workbook.charts)?;
        writer.add_xml(&partname, ct::OFC_DRAWING, xml);
        writer.add_rels(&partname, &rels)?;
    }

    let mut headings = Vec::with_capacity(2);
    if !worksheets.is_empty() {
        headings.push(("Worksheets", worksheets.len()));
    }
    if !chartsheets.is_empty() {
        headings.push(("Charts", chartsheets.len()));
    }
    let titles: Vec<&str> = worksheets.iter().chain(&chartsheets).copied().collect();
    let app_uri = PackURI::new(APP_PROPERTIES_URI)?;
    let core_uri = PackURI::new(CORE_PROPERTIES_URI)?;
    writer.add_xml(&app_uri, ct::OFC_EXTENDED_PROPERTIES, properties.app_to_xml(&headings, &titles));
    writer.add_xml(&core_uri, ct::OPC_CORE_PROPERTIES, properties.core_to_xml(now));

    if !strings.is_empty() {
        writer.add_xml(&strings_uri, ct::SML_SHARED_STRINGS, strings.to_xml(string_refs));
    }
    writer.add_part(&styles_uri, workbook.styles.part());
    writer.add_part(&theme_uri, workbook.theme.part());

    for (id, chart) in workbook.charts.iter() {
        writer.add_part(&workbook.charts.partname(id)?, chart.part());
    }
    for (id, file) in workbook.media.iter() {
        writer.add_default(file.suffix(), file.mime_type());
        writer.add_file(&workbook.media.partname(id)?, file.content().to_vec());
    }

    let mut embedded = HashSet::new();
    for object in workbook
        .sheets
        .iter()
        .filter_map(Sheet::as_worksheet)
        .flat_map(Worksheet::ole_objects)
    {
        let partname = object.partname()?;
        if !embedded.insert(partname.clone()) {
            continue;
        }
        let suffix = object.suffix();
        let has_default = writer
            .content_types()
            .defaults()
            .any(|(ext, _)| ext.eq_ignore_ascii_case(suffix));
        if !suffix.is_empty() && !has_default {
            writer.add_default(suffix, object.content_type());
        }
        writer.add_override(&partname, object.content_type());
        writer.add_file(&partname, object.content().to_vec());
    }

    let package_uri = PackURI::new(PACKAGE_URI)?;
    let mut root_rels = Relationships::new(PACKAGE_URI);
    root_rels.add_relationship(rt::OFFICE_DOCUMENT, workbook_uri.membername(), false);
    root_rels.add_relationship(rt::CORE_PROPERTIES, core_uri.membername(), false);
    root_rels.add_relationship(rt::EXTENDED_PROPERTIES, app_uri.membername(), false);
    writer.add_rels(&package_uri, &root_rels)?;

    let bytes = writer.finish().map_err(|err| match err {
        OpcError::Consistency(message) => OoxmlError::Consistency(message),
        other => OoxmlError::Opc(other),
    })?;
    debug!(
        sheets = workbook.sheets.len(),
        drawings = workbook.drawings.len(),
        bytes = bytes.len();
        "package saved"
    );
    Ok(bytes)
}
