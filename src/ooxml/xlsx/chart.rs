//! Chart parts (`xl/charts/chart{N}.xml`).
//!
//! Series, axes and layout are not modelled: a chart is its XML payload. Charts live
//! in a workbook-wide arena like media, de-duplicated by the package path they were
//! loaded from.
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::xlsx::template::DEFAULT_CHART_XML;
use std::collections::{HashMap, HashSet};

/// Handle to a chart in the workbook arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartId(pub(crate) usize);

impl ChartId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    part: XmlPart,
}

impl Chart {
    /// A chart space with an empty plot area.
    pub fn new() -> Self {
        Self {
            part: XmlPart::new(ct::DML_CHART, DEFAULT_CHART_XML.as_bytes().to_vec()),
        }
    }

    /// Chart body read from a package.
    pub fn load(xml: Vec<u8>) -> Result<Self> {
        Ok(Self {
            part: XmlPart::load(ct::DML_CHART, xml)?,
        })
    }

    pub fn part(&self) -> &XmlPart {
        &self.part
    }
}

impl Default for Chart {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartCollection {
    charts: Vec<Chart>,
    sources: Vec<Option<String>>,
    by_source: HashMap<String, ChartId>,
}

impl ChartCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chart created in memory.
    pub fn add(&mut self, chart: Chart) -> ChartId {
        let id = ChartId(self.charts.len());
        self.charts.push(chart);
        self.sources.push(None);
        id
    }

    /// Chart for a package part referenced from a drawing. A path seen before yields
    /// the same id; a new one gets an empty chart until [`ChartCollection::fill`].
    pub fn register_part(&mut self, partname: &PackURI) -> ChartId {
        if let Some(&id) = self.by_source.get(partname.as_str()) {
            return id;
        }
        let id = self.add(Chart::new());
        self.sources[id.0] = Some(partname.to_string());
        self.by_source.insert(partname.to_string(), id);
        id
    }

    pub fn fill(&mut self, id: ChartId, chart: Chart) {
        if let Some(slot) = self.charts.get_mut(id.0) {
            *slot = chart;
        }
    }

    /// Package path a chart was loaded from, if any.
    pub fn source(&self, id: ChartId) -> Option<&str> {
        self.sources.get(id.0).and_then(|s| s.as_deref())
    }

    pub fn get(&self, id: ChartId) -> Option<&Chart> {
        self.charts.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChartId, &Chart)> {
        self.charts.iter().enumerate().map(|(i, c)| (ChartId(i), c))
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Keep only the charts in `used`, closing the gaps. Returns the new id of every
    /// kept chart.
    pub(crate) fn compact(&mut self, used: &HashSet<ChartId>) -> HashMap<ChartId, ChartId> {
        let mut remap = HashMap::with_capacity(used.len());
        let charts = std::mem::take(&mut self.charts);
        let sources = std::mem::take(&mut self.sources);
        self.by_source.clear();
        for (index, (chart, source)) in charts.into_iter().zip(sources).enumerate() {
            if !used.contains(&ChartId(index)) {
                continue;
            }
            let id = ChartId(self.charts.len());
            if let Some(source) = &source {
                self.by_source.insert(source.clone(), id);
            }
            self.charts.push(chart);
            self.sources.push(source);
            remap.insert(ChartId(index), id);
        }
        remap
    }

    /// `/xl/charts/chart{index + 1}.xml`, shared by the drawing relationship and the written entry.
    pub fn partname(&self, id: ChartId) -> Result<PackURI> {
        PackURI::new(format!("/xl/charts/chart{}.xml", id.0 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::part::Part;

    #[test]
    fn test_register_part_deduplicates() {
        let mut charts = ChartCollection::new();
        let a = PackURI::new("/xl/charts/chart7.xml").unwrap();
        let b = PackURI::new("/xl/charts/chart2.xml").unwrap();

        let first = charts.register_part(&a);
        let second = charts.register_part(&b);
        assert_eq!(charts.register_part(&a), first);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts.source(second), Some("/xl/charts/chart2.xml"));

        assert_eq!(charts.partname(first).unwrap().as_str(), "/xl/charts/chart1.xml");
        assert_eq!(charts.partname(second).unwrap().as_str(), "/xl/charts/chart2.xml");
    }

    #[test]
    fn test_fill_replaces_placeholder() {
        let mut charts = ChartCollection::new();
        let id = charts.register_part(&PackURI::new("/xl/charts/chart1.xml").unwrap());
        let xml = br#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart/></c:chartSpace>"#;
        charts.fill(id, Chart::load(xml.to_vec()).unwrap());
        assert_eq!(charts.get(id).unwrap().part().blob(), &xml[..]);
        assert_eq!(charts.get(id).unwrap().part().content_type(), ct::DML_CHART);
    }

    #[test]
    fn test_compact_closes_gaps() {
        let mut charts = ChartCollection::new();
        charts.add(Chart::new());
        let loaded = charts.register_part(&PackURI::new("/xl/charts/chart4.xml").unwrap());

        let remap = charts.compact(&HashSet::from([loaded]));
        assert_eq!(charts.len(), 1);
        assert_eq!(remap.get(&ChartId(0)), None);
        assert_eq!(remap[&loaded], ChartId(0));
        assert_eq!(charts.source(ChartId(0)), Some("/xl/charts/chart4.xml"));
        assert_eq!(charts.register_part(&PackURI::new("/xl/charts/chart4.xml").unwrap()), ChartId(0));
        assert_eq!(charts.partname(ChartId(0)).unwrap().as_str(), "/xl/charts/chart1.xml");
    }

    #[test]
    fn test_in_memory_charts_are_never_shared() {
        let mut charts = ChartCollection::new();
        assert_ne!(charts.add(Chart::new()), charts.add(Chart::new()));
        assert_eq!(charts.source(ChartId(0)), None);
    }
}
