//! Persisted organizer snapshots
//!
//! The same shape is written to local durable storage by the UI on every
//! change and to the dossiers table on explicit save. Snapshots are value
//! copies: edits made while a save is in flight do not alter the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Organizer, Section, UNASSIGNED_SECTION_ID, UNASSIGNED_SECTION_NAME};

/// Full organizer state as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sections: Vec<Section>,
    pub salesperson: String,
    /// Set when the snapshot is persisted remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Organizer {
    /// Take a value-copy snapshot of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sections: self.sections.clone(),
            salesperson: self.salesperson.clone(),
            saved_at: None,
        }
    }

    /// Rebuild an organizer from a loaded snapshot
    ///
    /// Snapshots written by older UI builds may lack the default section;
    /// it is reinstated at the front so the organizer invariant holds.
    pub fn restore(snapshot: Snapshot) -> Self {
        let mut sections = snapshot.sections;
        if !sections.iter().any(|s| s.id == UNASSIGNED_SECTION_ID) {
            sections.insert(
                0,
                Section {
                    id: UNASSIGNED_SECTION_ID.to_string(),
                    name: UNASSIGNED_SECTION_NAME.to_string(),
                    items: Vec::new(),
                },
            );
        }
        Self {
            sections,
            salesperson: snapshot.salesperson,
        }
    }
}
