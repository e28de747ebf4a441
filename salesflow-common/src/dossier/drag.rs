//! Drag-and-drop transitions for the dossier builder
//!
//! Split into two layers: a pure geometry function that turns a pointer
//! position plus the hovered card's bounding box into an insertion index,
//! and a [`DragSession`] that feeds hover events into the organizer. The
//! drag-library plumbing (pointer capture, hit testing) stays in the UI;
//! everything that changes organizer state lives here and is testable.

use super::Organizer;

/// Geometry of the hovered drop target, in the same vertical coordinate
/// space as the pointer (page pixels in practice; only relative positions
/// matter here)
#[derive(Debug, Clone, Copy)]
pub struct TargetRect {
    pub top: f64,
    pub height: f64,
}

impl TargetRect {
    fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Compute the provisional insertion index for a cross-section hover
///
/// If the pointer sits below the midpoint of the hovered card, the dragged
/// item is inserted after it; otherwise before it.
pub fn insertion_index(pointer_y: f64, target: TargetRect, target_index: usize) -> usize {
    if pointer_y > target.midpoint() {
        target_index + 1
    } else {
        target_index
    }
}

/// Tracks one drag gesture from pick-up to release
///
/// Cross-section hovers mutate the organizer immediately (live preview), so
/// the UI reflows while the pointer moves. Same-section reordering is
/// deferred to [`DragSession::drag_end`]. If the gesture ends over no valid
/// target, the item stays wherever the last preview left it; there is
/// deliberately no revert to the pre-drag position.
#[derive(Debug, Default)]
pub struct DragSession {
    active_item_id: Option<String>,
    /// Index within the active item's section at the start of the current
    /// release cycle, refreshed by each preview splice
    origin_index: Option<usize>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the item currently being dragged, if any
    pub fn active_item(&self) -> Option<&str> {
        self.active_item_id.as_deref()
    }

    /// Start dragging an item
    pub fn begin(&mut self, organizer: &Organizer, item_id: &str) {
        if let Some((_, index)) = organizer.locate_item(item_id) {
            self.active_item_id = Some(item_id.to_string());
            self.origin_index = Some(index);
        }
    }

    /// Hover over a specific item card
    ///
    /// Only cross-section hovers are previewed live: the dragged item is
    /// removed from its origin section and spliced into the hovered item's
    /// section at the index derived from pointer geometry. Hovering within
    /// the origin section is a no-op until release.
    pub fn drag_over_item(
        &mut self,
        organizer: &mut Organizer,
        hovered_item_id: &str,
        pointer_y: f64,
        target: TargetRect,
    ) {
        let Some(active_id) = self.active_item_id.clone() else {
            return;
        };
        if active_id == hovered_item_id {
            return;
        }
        let Some((active_section, _)) = organizer.locate_item(&active_id) else {
            return;
        };
        let Some((hovered_section, hovered_index)) = organizer.locate_item(hovered_item_id) else {
            return;
        };
        if active_section == hovered_section {
            return;
        }

        let target_section = hovered_section.to_string();
        let index = insertion_index(pointer_y, target, hovered_index);
        let Some(item) = organizer.take_item(&active_id) else {
            return;
        };
        if let Some(section) = organizer.sections.iter_mut().find(|s| s.id == target_section) {
            let index = index.min(section.items.len());
            section.items.insert(index, item);
            self.origin_index = Some(index);
        }
    }

    /// Hover over a section container (not a specific card)
    ///
    /// Appends the dragged item to the end of that section when it differs
    /// from the item's current section.
    pub fn drag_over_section(&mut self, organizer: &mut Organizer, section_id: &str) {
        let Some(active_id) = self.active_item_id.clone() else {
            return;
        };
        let Some((current_section, _)) = organizer.locate_item(&active_id) else {
            return;
        };
        if current_section == section_id {
            return;
        }
        if organizer.section(section_id).is_none() {
            return;
        }
        if let Some(item) = organizer.take_item(&active_id) {
            if let Some(section) = organizer.sections.iter_mut().find(|s| s.id == section_id) {
                self.origin_index = Some(section.items.len());
                section.items.push(item);
            }
        }
    }

    /// Release the drag gesture
    ///
    /// If the release target is an item in the same section where the
    /// dragged item now resides (after any live previews) and its index
    /// differs, the section is reordered. The active item id is cleared
    /// unconditionally, whether or not the drop landed anywhere valid.
    pub fn drag_end(&mut self, organizer: &mut Organizer, over_item_id: Option<&str>) {
        let active_id = self.active_item_id.take();
        let origin_index = self.origin_index.take();

        let (Some(active_id), Some(over_id)) = (active_id, over_item_id) else {
            return;
        };
        if active_id == over_id {
            return;
        }
        let Some((active_section, _)) = organizer.locate_item(&active_id) else {
            return;
        };
        let Some((over_section, over_index)) = organizer.locate_item(over_id) else {
            return;
        };
        if active_section != over_section {
            return;
        }

        let section_id = active_section.to_string();
        if let Some(from) = origin_index {
            if from != over_index {
                organizer.reorder_within_section(&section_id, from, over_index);
            }
        }
    }
}
