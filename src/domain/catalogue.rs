//! Line-item catalogue: sections, items, and the edit rules the admin
//! surface enforces.

use super::decimal::lenient;
use super::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hardware SKUs that count as extensions for the sliding scales.
///
/// Covers both catalogue generations: the Yealink handsets shipped in the
/// fallback catalogue and the generic ids seeded by the admin store.
pub const EXTENSION_ITEM_IDS: &[&str] = &[
    "yealink-t31p",
    "yealink-t34w",
    "yealink-t43u",
    "yealink-t44u",
    "yealink-w73p",
    "yealink-w73h",
    "mobile-app",
    "switchboard",
    "desktop-phone",
    "cordless-phone",
    "mobile-apps",
];

pub fn is_extension_item(id: &str) -> bool {
    EXTENSION_ITEM_IDS.contains(&id)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogueError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    #[error("item '{item}' not found in section '{section}'")]
    UnknownItem { section: SectionId, item: String },
    #[error("item '{item}' in section '{section}' is locked and cannot be removed")]
    LockedItemRemoved { section: SectionId, item: String },
    #[error("item '{item}' in section '{section}' has a negative cost")]
    NegativeCost { section: SectionId, item: String },
    #[error("item '{item}' appears more than once in section '{section}'")]
    DuplicateItem { section: SectionId, item: String },
    #[error("section '{0}' appears more than once")]
    DuplicateSection(SectionId),
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Hardware,
    Connectivity,
    Licensing,
}

impl SectionId {
    pub const ALL: [SectionId; 3] = [
        SectionId::Hardware,
        SectionId::Connectivity,
        SectionId::Licensing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Hardware => "hardware",
            SectionId::Connectivity => "connectivity",
            SectionId::Licensing => "licensing",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionId::Hardware => "Hardware",
            SectionId::Connectivity => "Connectivity",
            SectionId::Licensing => "Licensing",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hardware" => Ok(SectionId::Hardware),
            "connectivity" => Ok(SectionId::Connectivity),
            "licensing" => Ok(SectionId::Licensing),
            other => Err(CatalogueError::UnknownSection(other.to_string())),
        }
    }
}

/// A priced line item. `cost` and `quantity` coerce unusable input to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "cost", default, deserialize_with = "lenient::decimal")]
    pub unit_cost: Decimal,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub locked: bool,
}

impl LineItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_cost: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_cost,
            quantity: 0,
            locked: false,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    #[serde(alias = "title", default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Section {
    pub fn new(id: SectionId, items: Vec<LineItem>) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            items,
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// First section with the given id; later duplicates are ignored.
pub fn find_section(sections: &[Section], id: SectionId) -> Option<&Section> {
    sections.iter().find(|section| section.id == id)
}

/// Σ cost × quantity over a section, zero when the section is missing.
pub fn section_total(sections: &[Section], id: SectionId) -> Decimal {
    find_section(sections, id).map_or_else(Decimal::zero, Section::total)
}

/// Derive an item id from its display name (`"Fiber Line"` -> `"fiber-line"`).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Validate an edited catalogue against the current one.
///
/// Locked items must survive the edit, costs must not be negative and ids
/// must be unique within a section. Items without an id get one from their
/// name. Hardware extension SKUs are always
/// locked, as is anything that was locked before.
pub fn replace_items(
    existing: &[Section],
    incoming: Vec<Section>,
) -> Result<Vec<Section>, CatalogueError> {
    let mut seen_sections = HashSet::new();
    for section in &incoming {
        if !seen_sections.insert(section.id) {
            return Err(CatalogueError::DuplicateSection(section.id));
        }
    }

    for current in existing {
        for item in current.items.iter().filter(|item| item.locked) {
            let kept = find_section(&incoming, current.id)
                .and_then(|section| section.item(&item.id))
                .is_some();
            if !kept {
                return Err(CatalogueError::LockedItemRemoved {
                    section: current.id,
                    item: item.id.clone(),
                });
            }
        }
    }

    let mut sections = incoming;
    for section in &mut sections {
        if section.name.trim().is_empty() {
            section.name = section.id.display_name().to_string();
        }

        let mut seen_items = HashSet::new();
        for item in &mut section.items {
            if item.id.trim().is_empty() {
                item.id = slugify(&item.name);
            }
            if item.id.is_empty() {
                return Err(CatalogueError::InvalidItem(format!(
                    "item '{}' in section '{}' has no id",
                    item.name, section.id
                )));
            }
            if !seen_items.insert(item.id.clone()) {
                return Err(CatalogueError::DuplicateItem {
                    section: section.id,
                    item: item.id.clone(),
                });
            }
            if item.unit_cost.is_negative() {
                return Err(CatalogueError::NegativeCost {
                    section: section.id,
                    item: item.id.clone(),
                });
            }

            let was_locked = find_section(existing, section.id)
                .and_then(|s| s.item(&item.id))
                .is_some_and(|i| i.locked);
            let is_extension = section.id == SectionId::Hardware && is_extension_item(&item.id);
            item.locked = item.locked || was_locked || is_extension;
        }
    }

    Ok(sections)
}
