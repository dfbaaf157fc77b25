//! Events processed by the widget controller.
//!
//! User interactions and async completions arrive through the same channel
//! and are applied at a single mutation point. Async completions echo the
//! generation they were scheduled under so the controller can recognize and
//! drop anything superseded in the meantime.

use intake_protocol::SessionId;
use intake_protocol::SuggestionSet;

use crate::selection::PhotoFile;
use crate::selection::PhotoId;

#[derive(Debug)]
pub enum WidgetEvent {
    /// The user picked files (file dialog, drag and drop).
    FilesPicked(Vec<PhotoFile>),
    /// The user removed one thumbnail.
    RemovePhoto(PhotoId),
    /// The user cleared the whole selection.
    ClearAll,
    /// Widget teardown short of disposal: selection, token, status all reset.
    Reset,
    /// The settle timer scheduled under `generation` elapsed uncanceled.
    SettleElapsed { generation: u64 },
    /// The analysis request launched under `generation` finished.
    AnalysisSettled {
        generation: u64,
        outcome: AnalysisOutcome,
    },
}

/// Terminal result of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// 2xx with body status `"ok"` and a usable session token.
    Accepted {
        session: SessionId,
        suggestions: SuggestionSet,
    },
    /// The server answered but refused: non-2xx, non-"ok" body status, or an
    /// unusable token.
    Rejected { message: Option<String> },
    /// The request never produced a server answer.
    Unreachable,
}
