//! Core engine for the product photo intake widget.
//!
//! The widget keeps a user's photo selection, a server-backed upload session
//! token, and a debounced background analysis request consistent under rapid
//! interaction. All state lives in one [`PhotoIntake`] instance and is
//! mutated only through [`PhotoIntake::handle_event`]; timers and network
//! requests are spawned tasks that report back through the event channel.

pub mod analysis;
pub mod client;
pub mod config;
pub mod events;
pub mod form;
pub mod preview;
pub mod render;
pub mod selection;
pub mod session;
pub mod suggestions;
pub mod widget;

pub use client::AnalysisTransport;
pub use client::HttpTransport;
pub use client::PhotoPart;
pub use config::EndpointConfig;
pub use config::IntakeConfig;
pub use events::AnalysisOutcome;
pub use events::WidgetEvent;
pub use form::SubmissionPlan;
pub use render::ViewModel;
pub use selection::PhotoFile;
pub use selection::PhotoId;
pub use selection::SelectionError;
pub use suggestions::ProductForm;
pub use widget::PhotoIntake;
