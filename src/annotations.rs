//! The annotation store.
//!
//! Notes are kept in insertion order, which is also display order. Each
//! note is either viewing or editing; `draft_text` may only differ from
//! `text` while editing. Every command is a synchronous mutation followed
//! by a snapshot write. Commands that target an unknown note or carry blank
//! text change nothing and write nothing.

use crate::models::Annotation;
use crate::storage::{self, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Storage key of the durable snapshot.
pub const STORAGE_KEY: &str = "comment";

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct AnnotationState {
    #[serde(default)]
    comments: Vec<Annotation>,
    #[serde(default)]
    drafts: BTreeMap<String, String>,
}

/// Stored ids further than this past the clock are not resumed from.
const MAX_ID_SKEW_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Issues strictly increasing, millisecond-based note ids.
///
/// When two notes are created within the same millisecond, or the clock
/// steps backwards, the next id is one past the last one issued.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Resume after the highest numeric id in `existing`.
    ///
    /// Ids more than a day ahead of `now` cannot come from this generator
    /// and are ignored.
    pub fn resume<'a>(
        existing: impl IntoIterator<Item = &'a Annotation>,
        now: DateTime<Utc>,
    ) -> Self {
        let ceiling = now.timestamp_millis().saturating_add(MAX_ID_SKEW_MILLIS);
        let last = existing
            .into_iter()
            .filter_map(|note| note.id.parse::<i64>().ok())
            .filter(|&id| id <= ceiling)
            .max()
            .unwrap_or(0);
        Self { last }
    }

    /// Next id for a note created at `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        self.last = if millis > self.last {
            millis
        } else {
            self.last.saturating_add(1)
        };
        self.last.to_string()
    }
}

/// Owner of all dashboard notes and per-dashboard draft input.
pub struct AnnotationStore {
    state: AnnotationState,
    ids: IdGenerator,
    storage: Arc<dyn Storage>,
}

impl AnnotationStore {
    /// Create a store, restoring the last persisted snapshot if any.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let state: AnnotationState =
            storage::restore(storage.as_ref(), STORAGE_KEY).unwrap_or_default();
        let ids = IdGenerator::resume(&state.comments, Utc::now());

        debug!(
            "Annotation store opened with {} notes and {} drafts",
            state.comments.len(),
            state.drafts.len()
        );

        Self {
            state,
            ids,
            storage,
        }
    }

    /// Pending input for a dashboard, or `""`.
    pub fn draft_text(&self, dashboard_id: &str) -> &str {
        self.state
            .drafts
            .get(dashboard_id)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replace the pending input for a dashboard.
    pub fn set_draft_text(&mut self, dashboard_id: &str, text: impl Into<String>) {
        self.state
            .drafts
            .insert(dashboard_id.to_string(), text.into());
        self.persist();
    }

    /// Commit the dashboard's draft as a new note.
    ///
    /// Returns the new note's id, or `None` if the draft was blank.
    pub fn add_comment(&mut self, dashboard_id: &str) -> Option<String> {
        let text = self.draft_text(dashboard_id).to_string();
        if text.trim().is_empty() {
            return None;
        }

        let now = Utc::now();
        let id = self.ids.next_id(now);
        self.state.comments.push(Annotation::new(
            id.clone(),
            dashboard_id.to_string(),
            text,
            now,
        ));
        self.state
            .drafts
            .insert(dashboard_id.to_string(), String::new());
        self.persist();

        debug!("Added note {} to dashboard {}", id, dashboard_id);
        Some(id)
    }

    /// Commit `text` as a new note, or the current draft when `text` is
    /// `None`.
    ///
    /// Blank `text` is refused without touching the stored draft.
    pub fn add_comment_with_text(
        &mut self,
        dashboard_id: &str,
        text: Option<String>,
    ) -> Option<String> {
        match text {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => {
                self.set_draft_text(dashboard_id, text);
                self.add_comment(dashboard_id)
            }
            None => self.add_comment(dashboard_id),
        }
    }

    /// Enter or leave edit mode. Either way the draft is reset to the
    /// committed text, so leaving discards unsaved changes.
    pub fn toggle_edit(&mut self, id: &str) -> bool {
        let Some(note) = self.find_mut(id) else {
            return false;
        };

        note.is_editing = !note.is_editing;
        note.draft_text = note.text.clone();
        self.persist();
        true
    }

    /// Update the unsaved text of a note that is being edited.
    pub fn set_edit_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        let Some(note) = self.find_mut(id).filter(|note| note.is_editing) else {
            return false;
        };

        note.draft_text = text.into();
        self.persist();
        true
    }

    /// Commit the draft of a note and leave edit mode.
    ///
    /// Blank drafts are refused and leave the note untouched.
    pub fn save_edit(&mut self, id: &str) -> bool {
        let Some(note) = self
            .find_mut(id)
            .filter(|note| !note.draft_text.trim().is_empty())
        else {
            return false;
        };

        note.text = note.draft_text.clone();
        note.is_editing = false;
        self.persist();
        true
    }

    /// Remove a note.
    pub fn delete_comment(&mut self, id: &str) -> bool {
        let Some(index) = self.state.comments.iter().position(|note| note.id == id) else {
            return false;
        };

        self.state.comments.remove(index);
        self.persist();
        true
    }

    /// Remove every note on every dashboard. Drafts are kept.
    pub fn clear_all(&mut self) {
        self.state.comments.clear();
        self.persist();
    }

    /// Look up a note by id.
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.state.comments.iter().find(|note| note.id == id)
    }

    /// Notes of one dashboard, in creation order.
    pub fn by_dashboard(&self, dashboard_id: &str) -> Vec<&Annotation> {
        self.state
            .comments
            .iter()
            .filter(|note| note.dashboard_id == dashboard_id)
            .collect()
    }

    pub fn count_by_dashboard(&self, dashboard_id: &str) -> usize {
        self.state
            .comments
            .iter()
            .filter(|note| note.dashboard_id == dashboard_id)
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.state.comments.len()
    }

    /// All notes in creation order.
    pub fn all(&self) -> &[Annotation] {
        &self.state.comments
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.state.comments.iter_mut().find(|note| note.id == id)
    }

    fn persist(&self) {
        storage::persist(self.storage.as_ref(), STORAGE_KEY, &self.state);
    }
}
