//! Drawing anchors: where a graphical object sits on the sheet grid.
//!
//! Three geometries are supported, matching the three SpreadsheetML drawing anchor
//! elements:
//!
//! - `absoluteAnchor`: a fixed page position and extent, independent of the grid
//! - `oneCellAnchor`: the top-left corner tracks one cell, the extent is fixed
//! - `twoCellAnchor`: both corners snap to cells and stretch with them
//!
//! Every anchor carries one object. Pictures and chart frames keep their reference
//! (a [`MediaId`] or [`ChartId`]) and round-trip; shapes, groups and connectors are
//! recognized so anchor order survives, but are written back as a placeholder shape.
//!
//! Relationship ids are not stored. When an anchor is serialized it asks the owning
//! drawing's relationship graph for a fresh id and emits exactly that id.
use crate::ooxml::common::xml::{attr_value, escape_xml, parse_i64, to_u32, u32_attr};
use crate::ooxml::opc::constants::{category, namespace, relationship_type};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::xlsx::chart::{ChartCollection, ChartId};
use crate::ooxml::xlsx::media::{MediaCollection, MediaId};
use log::warn;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;
/// English Metric Units per pixel at 96 dpi.
pub const EMU_PER_PIXEL: i64 = 9_525;

/// Cell-relative coordinate: zero-based column and row plus EMU offsets into the cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marker {
    pub col: u32,
    pub col_off: i64,
    pub row: u32,
    pub row_off: i64,
}

impl Marker {
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            col,
            col_off: 0,
            row,
            row_off: 0,
        }
    }

    pub fn with_offsets(mut self, col_off: i64, row_off: i64) -> Self {
        self.col_off = col_off;
        self.row_off = row_off;
        self
    }
}

/// Point on the page in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn from_pixels(x: i64, y: i64) -> Self {
        Self {
            x: x * EMU_PER_PIXEL,
            y: y * EMU_PER_PIXEL,
        }
    }
}

/// Size in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub cx: i64,
    pub cy: i64,
}

impl Extent {
    pub fn from_pixels(width: i64, height: i64) -> Self {
        Self {
            cx: width * EMU_PER_PIXEL,
            cy: height * EMU_PER_PIXEL,
        }
    }
}

/// `editAs` of a two-cell anchor: how the object reacts when cells move or resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditAs {
    TwoCell,
    #[default]
    OneCell,
    Absolute,
}

impl EditAs {
    pub fn as_str(self) -> &'static str {
        match self {
            EditAs::TwoCell => "twoCell",
            EditAs::OneCell => "oneCell",
            EditAs::Absolute => "absolute",
        }
    }

    /// Parse the attribute value. The schema default is `twoCell`.
    pub fn parse(value: &str) -> Self {
        match value {
            "oneCell" => EditAs::OneCell,
            "absolute" => EditAs::Absolute,
            _ => EditAs::TwoCell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorGeometry {
    Absolute { pos: Position, ext: Extent },
    OneCell { from: Marker, ext: Extent },
    TwoCell { from: Marker, to: Marker, edit_as: EditAs },
}

/// Kind of object carried by an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Picture,
    GraphicFrame,
    Shape,
    GroupShape,
    ConnectionShape,
    Unknown,
}

/// Object carried by an anchor, with the workbook-level handle for the kinds that
/// reference another part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingObject {
    Picture(MediaId),
    GraphicFrame(ChartId),
    Shape,
    GroupShape,
    ConnectionShape,
    Unknown,
}

impl DrawingObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            DrawingObject::Picture(_) => ObjectType::Picture,
            DrawingObject::GraphicFrame(_) => ObjectType::GraphicFrame,
            DrawingObject::Shape => ObjectType::Shape,
            DrawingObject::GroupShape => ObjectType::GroupShape,
            DrawingObject::ConnectionShape => ObjectType::ConnectionShape,
            DrawingObject::Unknown => ObjectType::Unknown,
        }
    }
}

/// Non-visual identity of the anchored object (`cNvPr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawingAnchor {
    geometry: AnchorGeometry,
    object: DrawingObject,
    shape: ShapeInfo,
}

impl DrawingAnchor {
    pub fn new(geometry: AnchorGeometry, object: DrawingObject, shape_id: u32) -> Self {
        let name = match object.object_type() {
            ObjectType::Picture => format!("Picture {}", shape_id),
            ObjectType::GraphicFrame => format!("Chart {}", shape_id),
            _ => format!("Shape {}", shape_id),
        };
        Self {
            geometry,
            object,
            shape: ShapeInfo { id: shape_id, name },
        }
    }

    pub fn geometry(&self) -> &AnchorGeometry {
        &self.geometry
    }

    pub fn object(&self) -> &DrawingObject {
        &self.object
    }

    pub fn shape(&self) -> &ShapeInfo {
        &self.shape
    }

    /// Read one anchor element whose start tag has just been consumed.
    ///
    /// `position` is the anchor's 1-based position in its drawing, used as the shape
    /// id when the object carries no `cNvPr`.
    pub(crate) fn read(
        reader: &mut Reader<&[u8]>,
        start: &BytesStart<'_>,
        position: u32,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Option<Self>> {
        let kind = start.local_name().as_ref().to_vec();
        let edit_as = attr_value(start, b"editAs")?
            .map(|v| EditAs::parse(&v))
            .unwrap_or(EditAs::TwoCell);

        let mut from = Marker::default();
        let mut to = Marker::default();
        let mut pos = Position::default();
        let mut ext = Extent::default();
        let mut object = DrawingObject::Unknown;
        let mut shape = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"from" => from = read_marker(reader, b"from")?,
                    b"to" => to = read_marker(reader, b"to")?,
                    b"AlternateContent" | b"Choice" => {},
                    b"Fallback" => {
                        reader.read_to_end(e.name())?;
                    },
                    b"pic" | b"graphicFrame" | b"sp" | b"grpSp" | b"cxnSp" => {
                        let local = e.local_name().as_ref().to_vec();
                        let scan = scan_object(reader)?;
                        shape = scan.shape.clone();
                        object = ctx.resolve(&local, &scan);
                    },
                    _ => {
                        reader.read_to_end(e.name())?;
                    },
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"pos" => {
                        pos = Position {
                            x: int_attr(&e, b"x")?,
                            y: int_attr(&e, b"y")?,
                        }
                    },
                    b"ext" => {
                        ext = Extent {
                            cx: int_attr(&e, b"cx")?,
                            cy: int_attr(&e, b"cy")?,
                        }
                    },
                    _ => {},
                },
                Event::End(e) if e.local_name().as_ref() == kind.as_slice() => break,
                Event::Eof => {
                    return Err(OpcError::XmlError(
                        "unexpected end of drawing inside an anchor".to_string(),
                    ));
                },
                _ => {},
            }
        }

        let geometry = match kind.as_slice() {
            b"twoCellAnchor" => AnchorGeometry::TwoCell { from, to, edit_as },
            b"oneCellAnchor" => AnchorGeometry::OneCell { from, ext },
            b"absoluteAnchor" => AnchorGeometry::Absolute { pos, ext },
            _ => return Ok(None),
        };
        let shape = shape.unwrap_or_else(|| ShapeInfo {
            id: position,
            name: String::new(),
        });
        Ok(Some(Self {
            geometry,
            object,
            shape,
        }))
    }

    /// Append this anchor's XML to `out`, minting relationships in `rels` for the
    /// picture or chart it references.
    pub(crate) fn write_xml(
        &self,
        out: &mut String,
        rels: &mut Relationships,
        media: &MediaCollection,
        charts: &ChartCollection,
    ) -> Result<()> {
        match &self.geometry {
            AnchorGeometry::TwoCell { from, to, edit_as } => {
                write!(out, r#"<xdr:twoCellAnchor editAs="{}">"#, edit_as.as_str()).map_err(write_error)?;
                write_marker(out, "from", from)?;
                write_marker(out, "to", to)?;
            },
            AnchorGeometry::OneCell { from, ext } => {
                out.push_str("<xdr:oneCellAnchor>");
                write_marker(out, "from", from)?;
                write!(out, r#"<xdr:ext cx="{}" cy="{}"/>"#, ext.cx, ext.cy).map_err(write_error)?;
            },
            AnchorGeometry::Absolute { pos, ext } => {
                out.push_str("<xdr:absoluteAnchor>");
                write!(
                    out,
                    r#"<xdr:pos x="{}" y="{}"/><xdr:ext cx="{}" cy="{}"/>"#,
                    pos.x, pos.y, ext.cx, ext.cy
                )
                .map_err(write_error)?;
            },
        }

        match self.object {
            DrawingObject::Picture(id) if media.get(id).is_some() => {
                let target = media.partname(id)?.relative_ref(rels.base_uri());
                let r_id = rels.add_relationship(relationship_type::IMAGE, &target, false);
                self.write_picture(out, &r_id)?;
            },
            DrawingObject::GraphicFrame(id) if charts.get(id).is_some() => {
                let target = charts.partname(id)?.relative_ref(rels.base_uri());
                let r_id = rels.add_relationship(relationship_type::CHART, &target, false);
                self.write_graphic_frame(out, &r_id)?;
            },
            _ => self.write_placeholder(out)?,
        }

        out.push_str("<xdr:clientData/>");
        out.push_str(match self.geometry {
            AnchorGeometry::TwoCell { .. } => "</xdr:twoCellAnchor>",
            AnchorGeometry::OneCell { .. } => "</xdr:oneCellAnchor>",
            AnchorGeometry::Absolute { .. } => "</xdr:absoluteAnchor>",
        });
        Ok(())
    }

    /// `cNvPr` name: the one read or assigned, else `{fallback} {id}`.
    fn display_name(&self, fallback: &str) -> String {
        if self.shape.name.is_empty() {
            format!("{} {}", fallback, self.shape.id)
        } else {
            escape_xml(&self.shape.name)
        }
    }

    fn write_picture(&self, out: &mut String, r_id: &str) -> Result<()> {
        write!(
            out,
            r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{}" name="{}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>"#,
            self.shape.id,
            self.display_name("Picture")
        )
        .and_then(|_| {
            write!(
                out,
                r#"<xdr:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>"#,
                r_id
            )
        })
        .map_err(write_error)?;
        out.push_str(
            r#"<xdr:spPr><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill></xdr:spPr></xdr:pic>"#,
        );
        Ok(())
    }

    fn write_graphic_frame(&self, out: &mut String, r_id: &str) -> Result<()> {
        write!(
            out,
            r#"<xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="{}" name="{}"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>"#,
            self.shape.id,
            self.display_name("Chart")
        )
        .map_err(write_error)?;
        out.push_str(r#"<xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm>"#);
        write!(
            out,
            r#"<a:graphic><a:graphicData uri="{ns}"><c:chart xmlns:c="{ns}" r:id="{r_id}"/></a:graphicData></a:graphic></xdr:graphicFrame>"#,
            ns = namespace::DML_CHART,
            r_id = r_id
        )
        .map_err(write_error)
    }

    fn write_placeholder(&self, out: &mut String) -> Result<()> {
        write!(
            out,
            r#"<xdr:sp macro="" textlink=""><xdr:nvSpPr><xdr:cNvPr id="{}" name="{}"/><xdr:cNvSpPr/></xdr:nvSpPr><xdr:spPr/></xdr:sp>"#,
            self.shape.id,
            self.display_name("Shape")
        )
        .map_err(write_error)
    }

    /// Swap the arena handles after the media or chart arena was compacted. A handle
    /// with no new position leaves the object unresolved.
    pub(crate) fn remap_object(&mut self, media: &HashMap<MediaId, MediaId>, charts: &HashMap<ChartId, ChartId>) {
        self.object = match self.object {
            DrawingObject::Picture(id) => media.get(&id).map_or(DrawingObject::Unknown, |&id| DrawingObject::Picture(id)),
            DrawingObject::GraphicFrame(id) => charts
                .get(&id)
                .map_or(DrawingObject::Unknown, |&id| DrawingObject::GraphicFrame(id)),
            other => other,
        };
    }
}

fn write_error(e: std::fmt::Error) -> OpcError {
    OpcError::XmlError(format!("XML write error: {}", e))
}

/// Workbook state an anchor resolves its references against while loading.
pub(crate) struct LoadContext<'a> {
    pub drawing: &'a PackURI,
    pub rels: Option<&'a Relationships>,
    pub media: &'a mut MediaCollection,
    pub charts: &'a mut ChartCollection,
}

impl LoadContext<'_> {
    fn resolve(&mut self, tag: &[u8], scan: &ObjectScan) -> DrawingObject {
        match tag {
            b"pic" => match scan.embed.as_deref().and_then(|id| self.target(id, category::IMAGE)) {
                Some(partname) => DrawingObject::Picture(self.media.register_part(&partname)),
                None => DrawingObject::Unknown,
            },
            b"graphicFrame" => match scan.chart.as_deref().and_then(|id| self.target(id, category::CHART)) {
                Some(partname) => DrawingObject::GraphicFrame(self.charts.register_part(&partname)),
                None => DrawingObject::Unknown,
            },
            b"sp" => DrawingObject::Shape,
            b"grpSp" => DrawingObject::GroupShape,
            b"cxnSp" => DrawingObject::ConnectionShape,
            _ => DrawingObject::Unknown,
        }
    }

    fn target(&self, r_id: &str, category: &str) -> Option<PackURI> {
        let rel = self
            .rels
            .and_then(|rels| rels.relationship_by_id(r_id))
            .filter(|rel| !rel.is_external() && rel.matches_category(category));
        match rel.map(|rel| rel.target_partname()) {
            Some(Ok(partname)) => Some(partname),
            Some(Err(e)) => {
                warn!(drawing = self.drawing.as_str(), r_id = r_id; "bad drawing relationship target: {}", e);
                None
            },
            None => {
                warn!(drawing = self.drawing.as_str(), r_id = r_id; "drawing relationship does not resolve");
                None
            },
        }
    }
}

/// What an object element yields: its `cNvPr` and any picture or chart reference.
#[derive(Debug, Default)]
struct ObjectScan {
    shape: Option<ShapeInfo>,
    embed: Option<String>,
    chart: Option<String>,
}

/// Consume an object element up to its matching end tag. The first `cNvPr` wins, so a
/// group reports its own identity rather than a child's.
fn scan_object(reader: &mut Reader<&[u8]>) -> Result<ObjectScan> {
    let mut scan = ObjectScan::default();
    let mut depth = 1usize;
    loop {
        let event = reader.read_event()?;
        let e = match &event {
            Event::Start(e) => {
                depth += 1;
                e
            },
            Event::Empty(e) => e,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                continue;
            },
            Event::Eof => break,
            _ => continue,
        };
        match e.local_name().as_ref() {
            b"cNvPr" if scan.shape.is_none() => {
                scan.shape = Some(ShapeInfo {
                    id: u32_attr(e, b"id")?.unwrap_or(0),
                    name: attr_value(e, b"name")?.unwrap_or_default(),
                });
            },
            b"blip" if scan.embed.is_none() => scan.embed = attr_value(e, b"embed")?,
            b"chart" if scan.chart.is_none() => scan.chart = attr_value(e, b"id")?,
            _ => {},
        }
    }
    Ok(scan)
}

/// Read `col`, `colOff`, `row` and `rowOff` until the marker's end tag. Other children
/// are ignored.
fn read_marker(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<Marker> {
    let mut marker = Marker::default();
    let mut field: Option<Vec<u8>> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => field = Some(e.local_name().as_ref().to_vec()),
            Event::Text(t) => {
                let text = t.unescape()?;
                let value = parse_i64(&text).unwrap_or(0);
                match field.as_deref() {
                    Some(b"col") => marker.col = to_u32(value, "marker column")?,
                    Some(b"colOff") => marker.col_off = value,
                    Some(b"row") => marker.row = to_u32(value, "marker row")?,
                    Some(b"rowOff") => marker.row_off = value,
                    _ => {},
                }
            },
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(marker)
}

fn write_marker(out: &mut String, tag: &str, marker: &Marker) -> Result<()> {
    write!(
        out,
        "<xdr:{tag}><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></xdr:{tag}>",
        marker.col,
        marker.col_off,
        marker.row,
        marker.row_off,
        tag = tag
    )
    .map_err(write_error)
}

fn int_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<i64> {
    Ok(attr_value(e, name)?.as_deref().and_then(parse_i64).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::chart::Chart;
    use crate::ooxml::xlsx::media::MediaFile;

    fn read_first(xml: &str, ctx: &mut LoadContext<'_>) -> DrawingAnchor {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => {
                    if let Some(anchor) = DrawingAnchor::read(&mut reader, &e, 1, ctx).unwrap() {
                        return anchor;
                    }
                },
                Event::Eof => panic!("no anchor"),
                _ => {},
            }
        }
    }

    #[test]
    fn test_read_two_cell_picture() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut rels = Relationships::new("/xl/drawings");
        rels.insert(
            "rId4".into(),
            relationship_type::IMAGE.into(),
            "../media/image1.png".into(),
            false,
        )
        .unwrap();
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &drawing,
            rels: Some(&rels),
            media: &mut media,
            charts: &mut charts,
        };

        let anchor = read_first(
            r#"<xdr:twoCellAnchor xmlns:xdr="x" xmlns:a="a" xmlns:r="r" editAs="oneCell">
                <xdr:from><xdr:col>1</xdr:col><xdr:colOff>9525</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
                <xdr:to><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>8</xdr:row><xdr:rowOff>190500</xdr:rowOff><xdr:future/></xdr:to>
                <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="7" name="Logo"/></xdr:nvPicPr>
                    <xdr:blipFill><a:blip r:embed="rId4"/></xdr:blipFill>
                    <xdr:spPr><a:xfrm><a:ext cx="1" cy="1"/></a:xfrm></xdr:spPr></xdr:pic>
                <xdr:clientData/>
            </xdr:twoCellAnchor>"#,
            &mut ctx,
        );

        assert_eq!(
            anchor.geometry(),
            &AnchorGeometry::TwoCell {
                from: Marker::new(2, 1).with_offsets(9525, 0),
                to: Marker::new(8, 4).with_offsets(0, 190500),
                edit_as: EditAs::OneCell,
            }
        );
        assert_eq!(anchor.object().object_type(), ObjectType::Picture);
        assert_eq!(anchor.shape(), &ShapeInfo { id: 7, name: "Logo".into() });
        assert_eq!(media.len(), 1);
        assert_eq!(
            media.get(MediaId(0)).unwrap().source(),
            Some("/xl/media/image1.png")
        );
    }

    #[test]
    fn test_dangling_chart_reference_is_unknown() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &drawing,
            rels: None,
            media: &mut media,
            charts: &mut charts,
        };
        let anchor = read_first(
            r#"<xdr:oneCellAnchor xmlns:xdr="x" xmlns:a="a" xmlns:c="c" xmlns:r="r">
                <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
                <xdr:ext cx="4572000" cy="2743200"/>
                <xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Chart 1"/></xdr:nvGraphicFramePr>
                <a:graphic><a:graphicData uri="c"><c:chart r:id="rId9"/></a:graphicData></a:graphic></xdr:graphicFrame>
                <xdr:clientData/>
            </xdr:oneCellAnchor>"#,
            &mut ctx,
        );
        assert_eq!(anchor.object(), &DrawingObject::Unknown);
        assert_eq!(
            anchor.geometry(),
            &AnchorGeometry::OneCell {
                from: Marker::default(),
                ext: Extent { cx: 4572000, cy: 2743200 },
            }
        );
        assert!(charts.is_empty());
    }

    #[test]
    fn test_shapes_and_unknown_tags() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &drawing,
            rels: None,
            media: &mut media,
            charts: &mut charts,
        };
        let group = read_first(
            r#"<xdr:absoluteAnchor xmlns:xdr="x"><xdr:pos x="10" y="20"/><xdr:ext cx="30" cy="40"/>
                <xdr:grpSp><xdr:nvGrpSpPr><xdr:cNvPr id="3" name="Group 2"/></xdr:nvGrpSpPr>
                <xdr:sp><xdr:nvSpPr><xdr:cNvPr id="4" name="Inner"/></xdr:nvSpPr></xdr:sp></xdr:grpSp>
                <xdr:clientData/></xdr:absoluteAnchor>"#,
            &mut ctx,
        );
        assert_eq!(group.object(), &DrawingObject::GroupShape);
        assert_eq!(group.shape().name, "Group 2");

        let unknown = read_first(
            r#"<xdr:absoluteAnchor xmlns:xdr="x"><xdr:pos x="1" y="2"/><xdr:ext cx="3" cy="4"/>
                <xdr:contentPart><xdr:nested/></xdr:contentPart><xdr:clientData/></xdr:absoluteAnchor>"#,
            &mut ctx,
        );
        assert_eq!(unknown.object(), &DrawingObject::Unknown);
        assert_eq!(unknown.shape().id, 1);
    }

    #[test]
    fn test_write_mints_relationship_ids() {
        let mut media = MediaCollection::new();
        let image = media.add(MediaFile::new(vec![1, 2, 3], "png"));
        let mut charts = ChartCollection::new();
        charts.add(Chart::new());
        let chart = charts.add(Chart::new());
        let mut rels = Relationships::new("/xl/drawings");

        let picture = DrawingAnchor::new(
            AnchorGeometry::OneCell {
                from: Marker::new(0, 0),
                ext: Extent::from_pixels(10, 20),
            },
            DrawingObject::Picture(image),
            1,
        );
        let frame = DrawingAnchor::new(
            AnchorGeometry::TwoCell {
                from: Marker::new(1, 1),
                to: Marker::new(5, 5),
                edit_as: EditAs::default(),
            },
            DrawingObject::GraphicFrame(chart),
            2,
        );

        let mut out = String::new();
        picture.write_xml(&mut out, &mut rels, &media, &charts).unwrap();
        frame.write_xml(&mut out, &mut rels, &media, &charts).unwrap();

        assert!(out.contains(r#"<xdr:ext cx="95250" cy="190500"/>"#));
        assert!(out.contains(r#"<a:blip r:embed="rId1"/>"#));
        assert!(out.contains(r#"r:id="rId2""#));
        assert!(out.contains(r#"<xdr:twoCellAnchor editAs="oneCell">"#));
        assert_eq!(
            rels.relationship_by_id("rId1").unwrap().target_ref(),
            "../media/image1.png"
        );
        assert_eq!(
            rels.relationship_by_id("rId2").unwrap().target_ref(),
            "../charts/chart2.xml"
        );
    }

    #[test]
    fn test_unresolved_objects_write_placeholder() {
        let mut rels = Relationships::new("/xl/drawings");
        let anchor = DrawingAnchor::new(
            AnchorGeometry::Absolute {
                pos: Position::from_pixels(1, 1),
                ext: Extent::from_pixels(2, 2),
            },
            DrawingObject::Picture(MediaId(3)),
            5,
        );
        let mut out = String::new();
        anchor
            .write_xml(&mut out, &mut rels, &MediaCollection::new(), &ChartCollection::new())
            .unwrap();
        assert!(out.contains(r#"<xdr:cNvPr id="5" name="Picture 5"/>"#));
        assert!(out.contains("<xdr:sp "));
        assert!(rels.is_empty());
    }

    #[test]
    fn test_loaded_shape_name_is_written_back() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut rels = Relationships::new("/xl/drawings");
        rels.insert(
            "rId1".into(),
            relationship_type::IMAGE.into(),
            "../media/image1.png".into(),
            false,
        )
        .unwrap();
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &drawing,
            rels: Some(&rels),
            media: &mut media,
            charts: &mut charts,
        };
        let anchor = read_first(
            r#"<xdr:oneCellAnchor xmlns:xdr="x" xmlns:a="a" xmlns:r="r">
                <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
                <xdr:ext cx="9525" cy="9525"/>
                <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="4" name="Logo &amp; Co"/></xdr:nvPicPr>
                    <xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic>
                <xdr:clientData/>
            </xdr:oneCellAnchor>"#,
            &mut ctx,
        );

        let mut out = String::new();
        let mut written = Relationships::new("/xl/drawings");
        anchor.write_xml(&mut out, &mut written, &media, &charts).unwrap();
        assert!(out.contains(r#"<xdr:cNvPr id="4" name="Logo &amp; Co"/>"#));
    }

    #[test]
    fn test_oversized_marker_is_rejected() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &drawing,
            rels: None,
            media: &mut media,
            charts: &mut charts,
        };
        let mut reader = Reader::from_str(
            r#"<xdr:oneCellAnchor xmlns:xdr="x">
                <xdr:from><xdr:col>4294967296</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
                <xdr:ext cx="1" cy="1"/><xdr:clientData/>
            </xdr:oneCellAnchor>"#,
        );
        reader.config_mut().trim_text(true);
        let start = match reader.read_event().unwrap() {
            Event::Start(e) => e,
            other => panic!("unexpected event {:?}", other),
        };
        assert!(matches!(
            DrawingAnchor::read(&mut reader, &start, 1, &mut ctx),
            Err(OpcError::XmlError(_))
        ));
    }

    #[test]
    fn test_remap_object_after_compaction() {
        let mut anchor = DrawingAnchor::new(
            AnchorGeometry::Absolute {
                pos: Position::default(),
                ext: Extent::default(),
            },
            DrawingObject::GraphicFrame(ChartId(2)),
            1,
        );
        let charts = HashMap::from([(ChartId(2), ChartId(0))]);
        anchor.remap_object(&HashMap::new(), &charts);
        assert_eq!(anchor.object(), &DrawingObject::GraphicFrame(ChartId(0)));

        let mut picture = DrawingAnchor::new(
            AnchorGeometry::Absolute {
                pos: Position::default(),
                ext: Extent::default(),
            },
            DrawingObject::Picture(MediaId(1)),
            2,
        );
        picture.remap_object(&HashMap::new(), &charts);
        assert_eq!(picture.object(), &DrawingObject::Unknown);
    }
}
