//! Drawing parts (`xl/drawings/drawing{N}.xml`): the anchor list of one sheet.
use crate::ooxml::common::xml::XML_DECLARATION;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::xlsx::anchor::{AnchorGeometry, DrawingAnchor, DrawingObject, LoadContext};
use crate::ooxml::xlsx::chart::{ChartCollection, ChartId};
use crate::ooxml::xlsx::media::{MediaCollection, MediaId};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Handle to a drawing in the workbook's drawing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawingId(pub(crate) usize);

impl DrawingId {
    pub fn index(self) -> usize {
        self.0
    }

    /// `/xl/drawings/drawing{index + 1}.xml`.
    pub fn partname(self) -> Result<PackURI> {
        PackURI::new(format!("/xl/drawings/drawing{}.xml", self.0 + 1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    anchors: Vec<DrawingAnchor>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a drawing, registering the pictures and charts it references.
    ///
    /// Anchors inside `mc:AlternateContent` are taken from `mc:Choice`; the
    /// `mc:Fallback` branch repeats the same anchor and is skipped.
    pub(crate) fn from_xml(xml: &[u8], ctx: &mut LoadContext<'_>) -> Result<Self> {
        let mut drawing = Self::new();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"wsDr" | b"AlternateContent" | b"Choice" => {},
                    b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                        let position = drawing.anchors.len() as u32 + 1;
                        if let Some(anchor) = DrawingAnchor::read(&mut reader, &e, position, ctx)? {
                            drawing.anchors.push(anchor);
                        }
                    },
                    _ => {
                        reader.read_to_end(e.name())?;
                    },
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(drawing)
    }

    /// Append an anchor and return the shape id assigned to it.
    ///
    /// Ids are 1-based and unique within the drawing: one past the largest in use.
    pub fn add_anchor(&mut self, geometry: AnchorGeometry, object: DrawingObject) -> u32 {
        let shape_id = self
            .anchors
            .iter()
            .map(|a| a.shape().id)
            .max()
            .unwrap_or(0)
            .max(self.anchors.len() as u32)
            + 1;
        self.anchors.push(DrawingAnchor::new(geometry, object, shape_id));
        shape_id
    }

    pub(crate) fn remap_objects(&mut self, media: &HashMap<MediaId, MediaId>, charts: &HashMap<ChartId, ChartId>) {
        for anchor in &mut self.anchors {
            anchor.remap_object(media, charts);
        }
    }

    pub fn anchors(&self) -> &[DrawingAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Serialize the drawing. `rels` must be the drawing's own, initially empty,
    /// relationship graph; picture and chart relationships are added to it in
    /// anchor order.
    pub(crate) fn to_xml(
        &self,
        rels: &mut Relationships,
        media: &MediaCollection,
        charts: &ChartCollection,
    ) -> Result<String> {
        let mut xml = String::with_capacity(512 + self.anchors.len() * 768);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<xdr:wsDr xmlns:xdr="{}" xmlns:a="{}" xmlns:r="{}">"#,
            namespace::DML_SPREADSHEET_DRAWING,
            namespace::DML_MAIN,
            namespace::OFC_RELATIONSHIPS
        ));
        for anchor in &self.anchors {
            anchor.write_xml(&mut xml, rels, media, charts)?;
        }
        xml.push_str("</xdr:wsDr>");
        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type;
    use crate::ooxml::xlsx::anchor::{Extent, Marker, ObjectType, Position};
    use crate::ooxml::xlsx::chart::Chart;
    use crate::ooxml::xlsx::media::MediaFile;

    const ALTERNATE_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
  <mc:AlternateContent>
    <mc:Choice Requires="a14">
      <xdr:twoCellAnchor editAs="oneCell">
        <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
        <xdr:to><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>3</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
        <xdr:sp macro="" textlink=""><xdr:nvSpPr><xdr:cNvPr id="2" name="Slicer"/><xdr:cNvSpPr/></xdr:nvSpPr></xdr:sp>
        <xdr:clientData/>
      </xdr:twoCellAnchor>
    </mc:Choice>
    <mc:Fallback>
      <xdr:twoCellAnchor>
        <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
        <xdr:to><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>3</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
        <xdr:sp macro="" textlink=""><xdr:nvSpPr><xdr:cNvPr id="2" name="Fallback"/><xdr:cNvSpPr/></xdr:nvSpPr></xdr:sp>
        <xdr:clientData/>
      </xdr:twoCellAnchor>
    </mc:Fallback>
  </mc:AlternateContent>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="952500" cy="952500"/>
    <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="3" name="Picture 3"/><xdr:cNvPicPr/></xdr:nvPicPr>
      <xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill><xdr:spPr/></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>8</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="952500" cy="952500"/>
    <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="4" name="Picture 4"/><xdr:cNvPicPr/></xdr:nvPicPr>
      <xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill><xdr:spPr/></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
</xdr:wsDr>"#;

    #[test]
    fn test_alternate_content_counts_once() {
        let partname = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        let mut rels = Relationships::new("/xl/drawings");
        for r_id in ["rId1", "rId2"] {
            rels.insert(
                r_id.into(),
                relationship_type::IMAGE.into(),
                "../media/image1.png".into(),
                false,
            )
            .unwrap();
        }
        let mut media = MediaCollection::new();
        let mut charts = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &partname,
            rels: Some(&rels),
            media: &mut media,
            charts: &mut charts,
        };

        let drawing = Drawing::from_xml(ALTERNATE_CONTENT.as_bytes(), &mut ctx).unwrap();
        assert_eq!(drawing.len(), 3);
        assert_eq!(drawing.anchors()[0].shape().name, "Slicer");
        assert_eq!(drawing.anchors()[0].object().object_type(), ObjectType::Shape);
        assert_eq!(drawing.anchors()[1].object(), drawing.anchors()[2].object());
        assert_eq!(media.len(), 1);
    }

    #[test]
    fn test_add_anchor_assigns_sequential_ids() {
        let mut drawing = Drawing::new();
        let geometry = AnchorGeometry::Absolute {
            pos: Position::default(),
            ext: Extent::from_pixels(1, 1),
        };
        assert_eq!(drawing.add_anchor(geometry, DrawingObject::Shape), 1);
        assert_eq!(drawing.add_anchor(geometry, DrawingObject::Unknown), 2);
        assert_eq!(drawing.anchors()[1].shape().id, 2);
    }

    #[test]
    fn test_to_xml_reparses() {
        let mut media = MediaCollection::new();
        let image = media.add(MediaFile::new(vec![0x89, b'P'], "png"));
        let mut charts = ChartCollection::new();
        let chart = charts.add(Chart::new());

        let mut drawing = Drawing::new();
        drawing.add_anchor(
            AnchorGeometry::OneCell {
                from: Marker::new(2, 3),
                ext: Extent::from_pixels(64, 32),
            },
            DrawingObject::Picture(image),
        );
        drawing.add_anchor(
            AnchorGeometry::OneCell {
                from: Marker::new(10, 0),
                ext: Extent::from_pixels(480, 288),
            },
            DrawingObject::GraphicFrame(chart),
        );

        let mut rels = Relationships::new("/xl/drawings");
        let xml = drawing.to_xml(&mut rels, &media, &charts).unwrap();
        assert_eq!(rels.len(), 2);

        let partname = DrawingId(0).partname().unwrap();
        let mut media2 = MediaCollection::new();
        let mut charts2 = ChartCollection::new();
        let mut ctx = LoadContext {
            drawing: &partname,
            rels: Some(&rels),
            media: &mut media2,
            charts: &mut charts2,
        };
        let reparsed = Drawing::from_xml(xml.as_bytes(), &mut ctx).unwrap();
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed.anchors()[0].geometry(), drawing.anchors()[0].geometry());
        assert_eq!(reparsed.anchors()[1].object().object_type(), ObjectType::GraphicFrame);
        assert_eq!(charts2.source(crate::ooxml::xlsx::chart::ChartId(0)), Some("/xl/charts/chart1.xml"));
        assert_eq!(media2.get(crate::ooxml::xlsx::media::MediaId(0)).unwrap().source(), Some("/xl/media/image1.png"));
    }
}
