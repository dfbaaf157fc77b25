//! Analysis endpoint transport.
//!
//! [`AnalysisTransport`] is the seam between the controller and the network:
//! the engine only ever sees an [`AnalysisOutcome`]. The real implementation
//! posts multipart photo data with reqwest; tests swap in a scripted fake.

use std::future::Future;

use intake_protocol::AnalyzeResponse;
use intake_protocol::PHOTOS_FIELD;
use url::Url;

use crate::config::EndpointConfig;
use crate::events::AnalysisOutcome;

/// One photo as it goes on the wire: original file name plus binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPart {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Something that can run one analysis request to completion.
///
/// The returned future is awaited inside a spawned task that the scheduler
/// may abort; implementations must not mutate shared state before resolving.
pub trait AnalysisTransport: Send + Sync + 'static {
    fn analyze(&self, photos: Vec<PhotoPart>) -> impl Future<Output = AnalysisOutcome> + Send;
}

/// reqwest-backed transport for the pickup/pallet analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("intake/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: endpoint.analyze_url(),
        })
    }
}

impl AnalysisTransport for HttpTransport {
    fn analyze(&self, photos: Vec<PhotoPart>) -> impl Future<Output = AnalysisOutcome> + Send {
        let client = self.client.clone();
        let url = self.url.clone();
        async move {
            let mut form = reqwest::multipart::Form::new();
            for photo in photos {
                let part = reqwest::multipart::Part::bytes(photo.bytes).file_name(photo.name);
                form = form.part(PHOTOS_FIELD, part);
            }

            let response = match client.post(url).multipart(form).send().await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!("analysis request did not reach the server: {err}");
                    return AnalysisOutcome::Unreachable;
                }
            };

            let http_ok = response.status().is_success();
            match response.bytes().await {
                Ok(body) => classify_response(http_ok, &body),
                Err(err) => {
                    tracing::warn!("analysis response body could not be read: {err}");
                    AnalysisOutcome::Unreachable
                }
            }
        }
    }
}

/// Map an HTTP result onto an outcome, per the failure taxonomy: any non-2xx
/// or non-"ok" body is a rejection carrying the server's message when one is
/// present, and malformed bodies count as non-"ok".
pub fn classify_response(http_ok: bool, body: &[u8]) -> AnalysisOutcome {
    let response = AnalyzeResponse::from_body(body);
    if http_ok && response.is_ok() {
        if let Some(session) = response.session {
            return AnalysisOutcome::Accepted {
                session,
                suggestions: response.suggestions.unwrap_or_default(),
            };
        }
        tracing::warn!("analysis reply was ok but carried no usable session token");
    }
    AnalysisOutcome::Rejected {
        message: response.message,
    }
}
