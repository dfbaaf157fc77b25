//! View projection.
//!
//! `render` rebuilds the whole view model from current state on every call
//! and keeps no state of its own. Full rebuilds are the point: a stale,
//! patched view could still reference a preview that was already released.

use intake_protocol::StatusLine;
use serde::Serialize;

use crate::form::SubmissionPlan;
use crate::form::plan_submission;
use crate::selection::PhotoId;
use crate::selection::SelectionStore;
use crate::session::TokenState;

/// One thumbnail in the strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThumbnailView {
    pub id: PhotoId,
    pub preview_uri: String,
    pub file_name: String,
    pub byte_len: u64,
}

/// Everything the host needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub thumbnails: Vec<ThumbnailView>,
    pub clear_all_visible: bool,
    pub status: StatusLine,
    /// Value for the hidden `upload_session_id` field.
    pub token_field: String,
    pub submission: SubmissionPlan,
}

pub fn render(store: &SelectionStore, token: &TokenState, status: &StatusLine) -> ViewModel {
    let thumbnails = store
        .iter()
        .map(|photo| ThumbnailView {
            id: photo.id,
            preview_uri: photo.preview.uri(),
            file_name: photo.file.name().to_string(),
            byte_len: photo.file.byte_len(),
        })
        .collect::<Vec<_>>();

    ViewModel {
        clear_all_visible: !store.is_empty(),
        status: status.clone(),
        token_field: token.hidden_field_value(),
        submission: plan_submission(store, token),
        thumbnails,
    }
}
