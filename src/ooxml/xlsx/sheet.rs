//! Sheets as listed in the workbook: name, visibility, and the content kind.
use crate::ooxml::xlsx::chartsheet::Chartsheet;
use crate::ooxml::xlsx::drawing::DrawingId;
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl SheetState {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "hidden" => SheetState::Hidden,
            "veryHidden" => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetKind {
    Worksheet(Worksheet),
    Chartsheet(Chartsheet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) sheet_id: u32,
    pub(crate) state: SheetState,
    pub(crate) kind: SheetKind,
}

impl Sheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `sheetId` in the workbook: unique and stable across reordering.
    pub fn sheet_id(&self) -> u32 {
        self.sheet_id
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    pub fn kind(&self) -> &SheetKind {
        &self.kind
    }

    pub fn is_worksheet(&self) -> bool {
        matches!(self.kind, SheetKind::Worksheet(_))
    }

    pub fn as_worksheet(&self) -> Option<&Worksheet> {
        match &self.kind {
            SheetKind::Worksheet(ws) => Some(ws),
            SheetKind::Chartsheet(_) => None,
        }
    }

    pub fn as_worksheet_mut(&mut self) -> Option<&mut Worksheet> {
        match &mut self.kind {
            SheetKind::Worksheet(ws) => Some(ws),
            SheetKind::Chartsheet(_) => None,
        }
    }

    pub fn drawing(&self) -> Option<DrawingId> {
        match &self.kind {
            SheetKind::Worksheet(ws) => ws.drawing(),
            SheetKind::Chartsheet(cs) => cs.drawing(),
        }
    }

    pub(crate) fn set_drawing(&mut self, drawing: Option<DrawingId>) {
        match &mut self.kind {
            SheetKind::Worksheet(ws) => ws.set_drawing(drawing),
            SheetKind::Chartsheet(cs) => cs.set_drawing(drawing),
        }
    }
}

/// Whether `name` is usable as a sheet name: 1 to 31 characters, none of `[]:*?/\`,
/// and not starting or ending with an apostrophe.
pub fn is_valid_sheet_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=MAX_SHEET_NAME_LEN).contains(&len)
        && !name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        && !name.starts_with('\'')
        && !name.ends_with('\'')
}
