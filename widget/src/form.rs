//! Host form projection: what the surrounding form should actually submit.

use intake_protocol::SessionId;
use serde::Serialize;

use crate::selection::PhotoId;
use crate::selection::SelectionStore;
use crate::session::TokenState;

/// What the host form carries for the photo set on submission. The modes are
/// mutually exclusive; a selection is never submitted both ways.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmissionPlan {
    /// The server already analyzed this exact set; submit the token only.
    Token { session: SessionId },
    /// Submit the raw files and let the server analyze them on receipt.
    RawFiles { photos: Vec<PhotoId> },
    /// Nothing is selected and nothing is bound.
    Nothing,
}

/// Compute the submission mode for the current selection and token state.
pub fn plan_submission(store: &SelectionStore, token: &TokenState) -> SubmissionPlan {
    if let Some(session) = token.as_bound() {
        return SubmissionPlan::Token {
            session: session.clone(),
        };
    }
    if store.is_empty() {
        SubmissionPlan::Nothing
    } else {
        SubmissionPlan::RawFiles {
            photos: store.ids(),
        }
    }
}
