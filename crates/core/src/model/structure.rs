use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::{ChapterId, CourseId, PageId, UnitId};
use crate::model::unit::{ContentError, ContentUnit};

fn default_required() -> bool {
    true
}

//
// ─── PAGE ──────────────────────────────────────────────────────────────────────
//

/// Ordered container of content units.
///
/// `is_locked` marks the page as a gate: every later page stays closed until
/// this one is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub units: Vec<ContentUnit>,
}

impl Page {
    #[must_use]
    pub fn new(id: PageId, title: impl Into<String>, units: Vec<ContentUnit>) -> Self {
        Self {
            id,
            title: title.into(),
            is_locked: false,
            is_required: true,
            units,
        }
    }

    /// Mark this page as a gate for the pages after it.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.is_locked = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    #[must_use]
    pub fn find_unit(&self, unit_id: UnitId) -> Option<&ContentUnit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Chapter {
    #[must_use]
    pub fn new(id: ChapterId, title: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id,
            title: title.into(),
            pages,
        }
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Root aggregate of the content hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Course {
    #[must_use]
    pub fn new(id: CourseId, title: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            id,
            title: title.into(),
            chapters,
        }
    }

    /// Every page of the course in reading order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.chapters.iter().flat_map(|chapter| chapter.pages.iter())
    }

    /// Every unit of the course in reading order.
    pub fn units(&self) -> impl Iterator<Item = &ContentUnit> {
        self.pages().flat_map(|page| page.units.iter())
    }

    #[must_use]
    pub fn find_page(&self, page_id: PageId) -> Option<&Page> {
        self.pages().find(|page| page.id == page_id)
    }

    #[must_use]
    pub fn find_unit(&self, unit_id: UnitId) -> Option<&ContentUnit> {
        self.units().find(|unit| unit.id == unit_id)
    }

    #[must_use]
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units().map(|unit| unit.id).collect()
    }

    /// Check id uniqueness and every unit's content.
    ///
    /// Meant for the authoring boundary; the evaluators tolerate invalid units.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate page/unit id or malformed unit found.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut pages = HashSet::new();
        let mut units = HashSet::new();
        for page in self.pages() {
            if !pages.insert(page.id) {
                return Err(ContentError::DuplicatePage(page.id));
            }
            for unit in &page.units {
                if !units.insert(unit.id) {
                    return Err(ContentError::DuplicateUnit(unit.id));
                }
                unit.validate()?;
            }
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
