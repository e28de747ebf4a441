//! Dossier organizer: named sections holding ordered product line-items
//!
//! The organizer is the aggregate behind the dossier builder. It owns an
//! ordered list of sections, each holding an ordered list of items, and
//! guarantees that an item id lives in at most one section at a time.
//!
//! All mutation operations are tolerant of stale references: a lookup miss
//! is a no-op, never an error, because the UI can lag the real state by one
//! render cycle and must not crash on references to items that were removed
//! in the meantime. The only validations enforced here are non-blank section
//! names and the permanence of the `"unassigned"` section.

pub mod drag;
pub mod snapshot;

pub use snapshot::Snapshot;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved id of the default section. Always present, never deletable.
pub const UNASSIGNED_SECTION_ID: &str = "unassigned";

/// Display name given to the default section on a fresh organizer
pub const UNASSIGNED_SECTION_NAME: &str = "Productos";

/// A product line placed into the dossier
///
/// Display and pricing fields are value-copied from the catalog at selection
/// time; the organizer never aliases catalog records. The sales-annotation
/// fields (discount, note, features, warranty) are owned by the organizer
/// once the item is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    /// Discount percentage, 0-100
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub warranty_type: Option<String>,
    #[serde(default)]
    pub warranty_duration: Option<String>,
}

impl Item {
    /// Price after discount. Derived, never stored.
    pub fn effective_price(&self) -> f64 {
        self.price * (1.0 - self.discount / 100.0)
    }
}

/// Mutable sales-annotation fields of an [`Item`]
///
/// A closed set: illegal field/value combinations cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    /// Discount percentage; values outside 0-100 are clamped
    Discount(f64),
    Note(String),
    Features(Vec<String>),
    WarrantyType(Option<String>),
    WarrantyDuration(Option<String>),
}

/// A named, ordered bucket of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// The organizer aggregate: ordered sections plus the salesperson line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    pub sections: Vec<Section>,
    pub salesperson: String,
}

impl Organizer {
    /// Create an empty organizer holding only the default section
    pub fn new(salesperson: impl Into<String>) -> Self {
        Self {
            sections: vec![Section {
                id: UNASSIGNED_SECTION_ID.to_string(),
                name: UNASSIGNED_SECTION_NAME.to_string(),
                items: Vec::new(),
            }],
            salesperson: salesperson.into(),
        }
    }

    /// Reset to the initial state, keeping the salesperson
    pub fn reset(&mut self) {
        let salesperson = std::mem::take(&mut self.salesperson);
        *self = Organizer::new(salesperson);
    }

    /// True if any section contains an item with this id
    pub fn contains_item(&self, item_id: &str) -> bool {
        self.sections.iter().any(|s| s.items.iter().any(|i| i.id == item_id))
    }

    /// Add candidate items to the default section
    ///
    /// Candidates whose id already exists anywhere in the organizer are
    /// filtered out (global de-duplication, not per-section). Survivors get
    /// `discount = 0` and are appended to `"unassigned"` in their given
    /// order. A call where every candidate is a duplicate is a valid no-op.
    pub fn add_items(&mut self, candidates: Vec<Item>) {
        let survivors: Vec<Item> = candidates
            .into_iter()
            .filter(|item| !self.contains_item(&item.id))
            .map(|mut item| {
                item.discount = 0.0;
                item
            })
            .collect();

        if let Some(section) = self.section_mut(UNASSIGNED_SECTION_ID) {
            section.items.extend(survivors);
        }
    }

    /// Remove the item from whichever section contains it. No-op if absent.
    pub fn remove_item(&mut self, item_id: &str) {
        for section in &mut self.sections {
            section.items.retain(|i| i.id != item_id);
        }
    }

    /// Replace one mutable annotation field on the item. No-op if absent.
    pub fn update_item(&mut self, item_id: &str, field: ItemField) {
        if let Some(item) = self.item_mut(item_id) {
            match field {
                ItemField::Discount(pct) => item.discount = pct.clamp(0.0, 100.0),
                ItemField::Note(note) => item.note = note,
                ItemField::Features(features) => item.features = features,
                ItemField::WarrantyType(w) => item.warranty_type = w,
                ItemField::WarrantyDuration(w) => item.warranty_duration = w,
            }
        }
    }

    /// Duplicate the item in place
    ///
    /// The copy keeps every field except the id, which is freshly generated,
    /// and is inserted immediately after the original in its section.
    /// Returns the new id, or `None` if the source was not found.
    pub fn duplicate_item(&mut self, item_id: &str) -> Option<String> {
        for section in &mut self.sections {
            if let Some(pos) = section.items.iter().position(|i| i.id == item_id) {
                let mut copy = section.items[pos].clone();
                copy.id = Uuid::new_v4().to_string();
                let new_id = copy.id.clone();
                section.items.insert(pos + 1, copy);
                return Some(new_id);
            }
        }
        None
    }

    /// Append a new empty section with a fresh id
    ///
    /// Blank or whitespace-only names are rejected as a no-op; callers are
    /// expected to validate before calling. Returns the new section id.
    pub fn create_section(&mut self, name: &str) -> Option<String> {
        if name.trim().is_empty() {
            return None;
        }
        let id = Uuid::new_v4().to_string();
        self.sections.push(Section {
            id: id.clone(),
            name: name.trim().to_string(),
            items: Vec::new(),
        });
        Some(id)
    }

    /// Rename a section. No-op if the id is unknown or the name is blank.
    pub fn rename_section(&mut self, section_id: &str, new_name: &str) {
        if new_name.trim().is_empty() {
            return;
        }
        if let Some(section) = self.section_mut(section_id) {
            section.name = new_name.trim().to_string();
        }
    }

    /// Delete a section, merging its items into `"unassigned"`
    ///
    /// The deleted section's items are appended to the end of the default
    /// section, preserving their relative order. Deleting `"unassigned"`
    /// itself is a no-op.
    pub fn delete_section(&mut self, section_id: &str) {
        if section_id == UNASSIGNED_SECTION_ID {
            return;
        }
        let Some(pos) = self.sections.iter().position(|s| s.id == section_id) else {
            return;
        };
        let removed = self.sections.remove(pos);
        if let Some(default) = self.section_mut(UNASSIGNED_SECTION_ID) {
            default.items.extend(removed.items);
        }
    }

    /// Move an item to the end of another section
    ///
    /// If the item already lives in the target section this is a no-op (no
    /// reordering side effect). Silently ignores unknown item or section ids.
    pub fn move_item_to_section(&mut self, item_id: &str, target_section_id: &str) {
        let Some(current) = self.find_section_containing(item_id) else {
            return;
        };
        if current == target_section_id {
            return;
        }
        if self.section(target_section_id).is_none() {
            return;
        }
        if let Some(item) = self.take_item(item_id) {
            // Target existence checked above; take_item does not touch sections
            if let Some(target) = self.section_mut(target_section_id) {
                target.items.push(item);
            }
        }
    }

    /// Move one item within a section (classic array-move semantics)
    ///
    /// The element is removed at `from_index` and reinserted so it lands at
    /// `to_index` in the final list. Out-of-range indices are clamped.
    /// `from_index == to_index` is a no-op.
    pub fn reorder_within_section(&mut self, section_id: &str, from_index: usize, to_index: usize) {
        let Some(section) = self.section_mut(section_id) else {
            return;
        };
        if section.items.is_empty() || from_index == to_index {
            return;
        }
        let from = from_index.min(section.items.len() - 1);
        let item = section.items.remove(from);
        let to = to_index.min(section.items.len());
        section.items.insert(to, item);
    }

    /// Sum of item counts across all sections
    pub fn total_item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Sum of effective (post-discount) prices across all sections
    pub fn total_value(&self) -> f64 {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .map(Item::effective_price)
            .sum()
    }

    /// Id of the section owning the item, if any
    pub fn find_section_containing(&self, item_id: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.items.iter().any(|i| i.id == item_id))
            .map(|s| s.id.as_str())
    }

    /// Shared accessor for a section by id
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
            .find(|i| i.id == item_id)
    }

    /// Remove and return an item from whichever section holds it
    pub(crate) fn take_item(&mut self, item_id: &str) -> Option<Item> {
        for section in &mut self.sections {
            if let Some(pos) = section.items.iter().position(|i| i.id == item_id) {
                return Some(section.items.remove(pos));
            }
        }
        None
    }

    /// Position of an item within its section, with the section id
    pub(crate) fn locate_item(&self, item_id: &str) -> Option<(&str, usize)> {
        for section in &self.sections {
            if let Some(pos) = section.items.iter().position(|i| i.id == item_id) {
                return Some((section.id.as_str(), pos));
            }
        }
        None
    }
}
