//! Upload-session token holder.
//!
//! The token certifies that the server has already analyzed the exact photo
//! set currently selected. Any selection mutation therefore clears it; only a
//! successful analysis of the current selection can set it again.

use intake_protocol::SessionId;

/// State of the server-issued session token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenState {
    #[default]
    Empty,
    Bound(SessionId),
}

impl TokenState {
    pub fn bind(&mut self, session: SessionId) {
        *self = TokenState::Bound(session);
    }

    /// Drop any bound token. Returns whether a token was held.
    pub fn clear(&mut self) -> bool {
        match std::mem::take(self) {
            TokenState::Empty => false,
            TokenState::Bound(_) => true,
        }
    }

    pub fn as_bound(&self) -> Option<&SessionId> {
        match self {
            TokenState::Empty => None,
            TokenState::Bound(session) => Some(session),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, TokenState::Bound(_))
    }

    /// Value for the host form's hidden `upload_session_id` field: the token
    /// while bound, empty string otherwise.
    pub fn hidden_field_value(&self) -> String {
        match self {
            TokenState::Empty => String::new(),
            TokenState::Bound(session) => session.to_string(),
        }
    }
}
