#![forbid(unsafe_code)]

//! The six fixed content sections and the grid layouts that place them.
//!
//! # Invariants
//!
//! 1. A [`SectionTable`] always holds exactly one entry per [`SectionId`],
//!    stored in canonical order.
//! 2. Grid coordinates are derived from the canonical index alone, so every
//!    layout places every section on a distinct cell.

use std::fmt;
use std::str::FromStr;

use crate::geometry::{CanvasPosition, SECTION_SPAN};

/// One of the six fixed logical sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SectionId {
    /// Opening section.
    Capture,
    /// Technique section.
    Focus,
    /// Composition section.
    Frame,
    /// Lighting section.
    Exposure,
    /// Post-processing section.
    Develop,
    /// Gallery section.
    Portfolio,
}

impl SectionId {
    /// All sections in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Capture,
        Self::Focus,
        Self::Frame,
        Self::Exposure,
        Self::Develop,
        Self::Portfolio,
    ];

    /// Number of sections.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in canonical order (0-based).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Capture => 0,
            Self::Focus => 1,
            Self::Frame => 2,
            Self::Exposure => 3,
            Self::Develop => 4,
            Self::Portfolio => 5,
        }
    }

    /// Section at canonical index `i`, if any.
    #[must_use]
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Focus => "focus",
            Self::Frame => "frame",
            Self::Exposure => "exposure",
            Self::Develop => "develop",
            Self::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section name that does not match any [`SectionId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSection(pub String);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSection {}

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Grid cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCoord {
    /// Column (0-based).
    pub grid_x: u32,
    /// Row (0-based).
    pub grid_y: u32,
}

impl GridCoord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(grid_x: u32, grid_y: u32) -> Self {
        Self { grid_x, grid_y }
    }

    /// Canvas position of this cell at baseline zoom.
    #[must_use]
    pub fn canvas_origin(self) -> CanvasPosition {
        CanvasPosition::new(
            f64::from(self.grid_x) * SECTION_SPAN,
            f64::from(self.grid_y) * SECTION_SPAN,
            1.0,
        )
    }
}

/// Grid arrangement of the six sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GridLayout {
    /// Three columns, two rows.
    #[default]
    Grid3x2,
    /// Two columns, three rows.
    Grid2x3,
    /// A single horizontal row (timeline).
    Row,
    /// A single vertical column (stacked document).
    Column,
}

impl GridLayout {
    /// Number of columns in this arrangement.
    #[must_use]
    pub const fn columns(self) -> u32 {
        match self {
            Self::Grid3x2 => 3,
            Self::Grid2x3 => 2,
            Self::Row => 6,
            Self::Column => 1,
        }
    }

    /// Number of rows in this arrangement.
    #[must_use]
    pub const fn rows(self) -> u32 {
        match self {
            Self::Grid3x2 => 2,
            Self::Grid2x3 => 3,
            Self::Row => 1,
            Self::Column => 6,
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid3x2 => "grid_3x2",
            Self::Grid2x3 => "grid_2x3",
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

/// Static description of one section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionEntry {
    /// Which section this entry describes.
    pub id: SectionId,
    /// Cell in the configured layout.
    pub grid: GridCoord,
    /// Camera position when the section is active.
    pub position: CanvasPosition,
    /// Human-readable title (used in announcements).
    pub title: String,
    /// Display priority; lower values are more prominent.
    pub priority: u8,
}

impl SectionEntry {
    /// Entry for `id` placed on its cell in `layout`, titled `title`.
    #[must_use]
    pub fn on_layout(id: SectionId, layout: GridLayout, title: impl Into<String>) -> Self {
        let grid = crate::transform::section_grid_coordinates(id, layout);
        Self {
            id,
            grid,
            position: grid.canvas_origin(),
            title: title.into(),
            priority: id.index() as u8,
        }
    }
}

/// Reasons a set of section entries cannot form a [`SectionTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum SectionTableError {
    /// No entry for this section.
    Missing(SectionId),
    /// More than one entry for this section.
    Duplicate(SectionId),
    /// The entry's canonical position has a non-finite or non-positive component.
    InvalidPosition(SectionId),
    /// The entry has an empty title.
    EmptyTitle(SectionId),
}

impl fmt::Display for SectionTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(id) => write!(f, "section table is missing an entry for {id}"),
            Self::Duplicate(id) => write!(f, "section table has more than one entry for {id}"),
            Self::InvalidPosition(id) => write!(f, "section {id} has an invalid canonical position"),
            Self::EmptyTitle(id) => write!(f, "section {id} has an empty title"),
        }
    }
}

impl std::error::Error for SectionTableError {}

/// Validated, immutable table of exactly six section entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTable {
    entries: [SectionEntry; SectionId::COUNT],
}

impl SectionTable {
    /// Build a table, checking that every section appears exactly once.
    pub fn new(entries: Vec<SectionEntry>) -> Result<Self, SectionTableError> {
        let mut slots: [Option<SectionEntry>; SectionId::COUNT] = Default::default();
        for entry in entries {
            let slot = &mut slots[entry.id.index()];
            if slot.is_some() {
                return Err(SectionTableError::Duplicate(entry.id));
            }
            if !entry.position.is_finite() || entry.position.scale <= 0.0 {
                return Err(SectionTableError::InvalidPosition(entry.id));
            }
            if entry.title.trim().is_empty() {
                return Err(SectionTableError::EmptyTitle(entry.id));
            }
            *slot = Some(entry);
        }

        let mut missing = None;
        let entries = SectionId::ALL.map(|id| match slots[id.index()].take() {
            Some(entry) => entry,
            None => {
                missing.get_or_insert(id);
                SectionEntry::on_layout(id, GridLayout::default(), id.as_str())
            }
        });
        match missing {
            Some(id) => Err(SectionTableError::Missing(id)),
            None => Ok(Self { entries }),
        }
    }

    /// The default photography-themed table on the default layout.
    #[must_use]
    pub fn standard() -> Self {
        let layout = GridLayout::default();
        let titles = ["Capture", "Focus", "Frame", "Exposure", "Develop", "Portfolio"];
        let entries = SectionId::ALL.map(|id| SectionEntry::on_layout(id, layout, titles[id.index()]));
        Self { entries }
    }

    /// Entry for a section.
    #[inline]
    #[must_use]
    pub fn get(&self, id: SectionId) -> &SectionEntry {
        &self.entries[id.index()]
    }

    /// Iterate entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionEntry> {
        self.entries.iter()
    }

    /// The same sections, titles and priorities placed on `layout`'s cells.
    #[must_use]
    pub fn relayout(&self, layout: GridLayout) -> Self {
        let entries = self.entries.clone().map(|entry| {
            let grid = crate::transform::section_grid_coordinates(entry.id, layout);
            SectionEntry {
                grid,
                position: grid.canvas_origin(),
                ..entry
            }
        });
        Self { entries }
    }

    /// Section whose canonical position matches `position` (within epsilon).
    #[must_use]
    pub fn section_at(&self, position: &CanvasPosition) -> Option<SectionId> {
        self.entries
            .iter()
            .find(|e| e.position.approx_eq(position))
            .map(|e| e.id)
    }
}

impl Default for SectionTable {
    fn default() -> Self {
        Self::standard()
    }
}
