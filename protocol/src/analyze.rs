//! Wire types for the photo-analysis endpoint.
//!
//! The endpoint accepts a multipart POST with one binary part per photo
//! (field name [`PHOTOS_FIELD`], selection order preserved) and answers with
//! an [`AnalyzeResponse`]. Decoding is deliberately lenient: a malformed body
//! folds into a non-"ok" response instead of an error, because the widget
//! treats both the same way.

use serde::Deserialize;
use serde::Serialize;

use crate::session::SessionId;

/// Multipart field name the analysis endpoint expects for each photo part.
pub const PHOTOS_FIELD: &str = "photos";

/// Body of the analysis endpoint's JSON reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    /// `"ok"` on success; anything else (including absent) is a failure.
    #[serde(default)]
    pub status: String,
    /// Upload-session token covering the exact photo set that was analyzed.
    ///
    /// An invalid token shape fails body decoding, which downgrades the whole
    /// reply to a non-"ok" default; the server would reject such a token at
    /// submission time anyway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<SuggestionSet>,
    /// Human-readable failure detail, surfaced verbatim to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyzeResponse {
    pub const STATUS_OK: &'static str = "ok";

    pub fn is_ok(&self) -> bool {
        self.status == Self::STATUS_OK
    }

    /// Decode a response body, folding malformed JSON into a non-"ok"
    /// default.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Field suggestions derived from the analyzed photos.
///
/// The server pads absent values with empty strings, so every consumer must
/// treat blank and missing alike.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SuggestionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Destination routing code; may arrive as a number or as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod_destiny: Option<DestinationCode>,
    /// Display label paired with `cod_destiny`, when the server resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_reason: Option<String>,
    /// Unstructured description text; fallback when `short_description` is
    /// blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_raw: Option<String>,
}

/// A destination code as the server emits it: numeric code or free text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DestinationCode {
    Code(i64),
    Label(String),
}

impl DestinationCode {
    /// Normalized form used for option matching.
    pub fn canonical(&self) -> String {
        match self {
            DestinationCode::Code(code) => code.to_string(),
            DestinationCode::Label(label) => label.trim().to_string(),
        }
    }
}
