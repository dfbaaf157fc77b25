//! The widget controller.
//!
//! One `PhotoIntake` instance owns every piece of mutable widget state and is
//! the only thing allowed to change it. User interactions and async
//! completions both arrive as [`WidgetEvent`]s; spawned tasks never touch
//! state directly, they only send events carrying the generation they were
//! scheduled under. `handle_event` compares that generation against the
//! scheduler's current one and drops anything stale, which is what makes
//! "last trigger wins" hold even when a superseded completion is already
//! sitting in the queue.

use std::sync::Arc;

use intake_protocol::SessionId;
use intake_protocol::StatusLine;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;

use crate::analysis::AnalysisScheduler;
use crate::client::AnalysisTransport;
use crate::client::PhotoPart;
use crate::config::IntakeConfig;
use crate::events::AnalysisOutcome;
use crate::events::WidgetEvent;
use crate::preview::PreviewRegistry;
use crate::render::ViewModel;
use crate::render::render;
use crate::selection::SelectionStore;
use crate::session::TokenState;
use crate::suggestions::ProductForm;

const MSG_ANALYZING: &str = "Analyzing photos...";
const MSG_REVIEW: &str = "Analysis complete. Review the suggested fields before saving.";
const MSG_GENERIC_FAILURE: &str = "Unable to analyze photos right now. Please retry.";
const MSG_NETWORK_FAILURE: &str = "Network error while analyzing photos. Please retry.";
const MSG_CLEARED: &str = "Photos cleared. Add new photos to run the analysis again.";

/// One live photo-intake widget: selection, previews, session token, status,
/// form, and the analysis scheduler.
pub struct PhotoIntake<T: AnalysisTransport> {
    store: SelectionStore,
    previews: PreviewRegistry,
    token: TokenState,
    status: StatusLine,
    form: ProductForm,
    scheduler: AnalysisScheduler,
    transport: Arc<T>,
}

impl<T: AnalysisTransport> PhotoIntake<T> {
    /// Build a widget. The returned receiver carries the events produced by
    /// the widget's own timers and requests; the host must feed them back
    /// into [`PhotoIntake::handle_event`] alongside user events.
    pub fn new(
        config: IntakeConfig,
        form: ProductForm,
        transport: T,
    ) -> (Self, UnboundedReceiver<WidgetEvent>) {
        let (events_tx, events_rx) = unbounded_channel();
        let widget = Self {
            store: SelectionStore::new(config.max_photos, config.max_total_bytes),
            previews: PreviewRegistry::new(),
            token: TokenState::default(),
            status: StatusLine::neutral(),
            form,
            scheduler: AnalysisScheduler::new(config.settle_window, events_tx),
            transport: Arc::new(transport),
        };
        (widget, events_rx)
    }

    /// Apply one event. This is the single mutation point for widget state.
    pub fn handle_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::FilesPicked(files) => {
                if files.is_empty() {
                    return;
                }
                match self.store.add(files, &mut self.previews) {
                    Ok(added) => {
                        tracing::debug!("selection grew by {} photos", added.len());
                        self.on_selection_changed();
                    }
                    Err(err) => {
                        self.status = StatusLine::error(err.to_string());
                    }
                }
            }
            WidgetEvent::RemovePhoto(id) => {
                if self.store.remove(id, &mut self.previews) {
                    self.on_selection_changed();
                }
            }
            WidgetEvent::ClearAll => {
                if self.store.is_empty() {
                    return;
                }
                self.store.clear(&mut self.previews);
                self.token.clear();
                self.scheduler.cancel_all();
                self.status = StatusLine::info(MSG_CLEARED);
            }
            WidgetEvent::Reset => {
                self.store.clear(&mut self.previews);
                self.token.clear();
                self.scheduler.cancel_all();
                self.status = StatusLine::neutral();
            }
            WidgetEvent::SettleElapsed { generation } => {
                if generation != self.scheduler.generation() || self.store.is_empty() {
                    return;
                }
                self.status = StatusLine::progress(MSG_ANALYZING);
                self.scheduler.launch(
                    generation,
                    Arc::clone(&self.transport),
                    self.upload_parts(),
                );
            }
            WidgetEvent::AnalysisSettled {
                generation,
                outcome,
            } => {
                if generation != self.scheduler.generation() {
                    tracing::debug!("dropping stale analysis completion (generation {generation})");
                    return;
                }
                self.scheduler.request_settled();
                self.apply_outcome(outcome);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: AnalysisOutcome) {
        match outcome {
            AnalysisOutcome::Accepted {
                session,
                suggestions,
            } => {
                self.token.bind(session);
                self.form.apply_suggestions(&suggestions);
                self.status = StatusLine::success(MSG_REVIEW);
            }
            AnalysisOutcome::Rejected { message } => {
                self.token.clear();
                let text = message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| MSG_GENERIC_FAILURE.to_string());
                self.status = StatusLine::error(text);
            }
            AnalysisOutcome::Unreachable => {
                self.token.clear();
                self.status = StatusLine::error(MSG_NETWORK_FAILURE);
            }
        }
    }

    /// Shared tail of every successful selection mutation: the token is stale
    /// by definition, and analysis either re-arms or stands down.
    fn on_selection_changed(&mut self) {
        self.token.clear();
        if self.store.is_empty() {
            self.scheduler.cancel_all();
            self.status = StatusLine::neutral();
        } else {
            self.scheduler.schedule();
            self.status = StatusLine::progress(MSG_ANALYZING);
        }
    }

    fn upload_parts(&self) -> Vec<PhotoPart> {
        self.store
            .iter()
            .map(|photo| PhotoPart {
                name: photo.file.name().to_string(),
                bytes: photo.file.bytes().to_vec(),
            })
            .collect()
    }

    /// Project current state into a fresh view model.
    pub fn view(&self) -> ViewModel {
        render(&self.store, &self.token, &self.status)
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    /// Host-side edits (typing into the form) go through here.
    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.store
    }

    pub fn session_token(&self) -> Option<&SessionId> {
        self.token.as_bound()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Live preview handles; equals the selection length unless something
    /// leaked.
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    /// Tear the widget down: abort timers and requests, release every
    /// preview still held.
    pub fn dispose(mut self) {
        self.scheduler.cancel_all();
        self.store.clear(&mut self.previews);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_protocol::StatusTone;
    use intake_protocol::SuggestionSet;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::form::SubmissionPlan;
    use crate::selection::PhotoFile;

    const SESSION_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SESSION_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn session(raw: &str) -> SessionId {
        SessionId::parse(raw).expect("session id")
    }

    fn accepted(raw: &str, serial: &str) -> AnalysisOutcome {
        AnalysisOutcome::Accepted {
            session: session(raw),
            suggestions: SuggestionSet {
                serial_number: Some(serial.to_string()),
                ..SuggestionSet::default()
            },
        }
    }

    /// Transport that replays scripted outcomes after a fixed delay and
    /// counts how many requests were actually sent.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<AnalysisOutcome>>,
        delay: Duration,
        requests: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<AnalysisOutcome>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                delay,
                requests: AtomicUsize::new(0),
            })
        }

        fn requests_sent(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl AnalysisTransport for Arc<ScriptedTransport> {
        fn analyze(&self, _photos: Vec<PhotoPart>) -> impl Future<Output = AnalysisOutcome> + Send {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .expect("outcomes lock")
                .pop_front()
                .unwrap_or(AnalysisOutcome::Unreachable);
            let delay = self.delay;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcome
            }
        }
    }

    fn widget(
        outcomes: Vec<AnalysisOutcome>,
        delay: Duration,
    ) -> (
        PhotoIntake<Arc<ScriptedTransport>>,
        UnboundedReceiver<WidgetEvent>,
        Arc<ScriptedTransport>,
    ) {
        let transport = ScriptedTransport::new(outcomes, delay);
        let form = ProductForm::new(
            vec!["Servers".to_string()],
            vec!["4".to_string(), "Resale".to_string()],
        );
        let (widget, events) = PhotoIntake::new(IntakeConfig::default(), form, Arc::clone(&transport));
        (widget, events, transport)
    }

    fn photo(name: &str, len: usize) -> PhotoFile {
        PhotoFile::new(name, vec![0u8; len])
    }

    /// Wait for the widget's next internal event and apply it. The trailing
    /// yield gives any task spawned by the handler its first poll, so a
    /// just-launched request registers as sent before the test continues.
    async fn pump_one(
        widget: &mut PhotoIntake<Arc<ScriptedTransport>>,
        events: &mut UnboundedReceiver<WidgetEvent>,
    ) {
        let event = tokio::time::timeout(Duration::from_secs(600), events.recv())
            .await
            .expect("an internal event within the window")
            .expect("event channel open");
        widget.handle_event(event);
        tokio::task::yield_now().await;
    }

    /// Apply any internal events that are already queued, without waiting.
    fn pump_ready(
        widget: &mut PhotoIntake<Arc<ScriptedTransport>>,
        events: &mut UnboundedReceiver<WidgetEvent>,
    ) {
        while let Ok(event) = events.try_recv() {
            widget.handle_event(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pick_analyze_apply_flow() {
        let (mut widget, mut events, transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![
            photo("front.jpg", 2 * 1024 * 1024),
            photo("back.jpg", 2 * 1024 * 1024),
            photo("label.jpg", 2 * 1024 * 1024),
        ]));

        // Inside the settle window: three thumbnails, progress tone, no
        // request sent yet.
        let view = widget.view();
        assert_eq!(view.thumbnails.len(), 3);
        assert_eq!(view.status.tone, StatusTone::Progress);
        assert_eq!(transport.requests_sent(), 0);

        pump_one(&mut widget, &mut events).await; // settle fires
        assert_eq!(transport.requests_sent(), 1);
        pump_one(&mut widget, &mut events).await; // request settles

        let view = widget.view();
        assert_eq!(view.status.tone, StatusTone::Success);
        assert_eq!(view.token_field, SESSION_A);
        assert_eq!(widget.form().serial_number.value(), "SN1");
        assert_eq!(
            view.submission,
            SubmissionPlan::Token {
                session: session(SESSION_A)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_batch_is_rejected_without_mutation() {
        let (mut widget, mut events, transport) = widget(vec![], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo(
            "huge.jpg",
            26 * 1024 * 1024,
        )]));

        let view = widget.view();
        assert_eq!(view.thumbnails.len(), 0);
        assert_eq!(view.status.tone, StatusTone::Error);
        assert_eq!(view.status.text, "Image batch exceeds 25 MB limit.");
        assert_eq!(widget.live_previews(), 0);

        // No timer was armed for the rejected add.
        tokio::time::sleep(Duration::from_secs(1)).await;
        pump_ready(&mut widget, &mut events);
        assert_eq!(transport.requests_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn too_many_photos_rejected_with_limit_message() {
        let (mut widget, _events, _transport) = widget(vec![], Duration::ZERO);

        let batch: Vec<PhotoFile> = (0..11).map(|i| photo(&format!("p{i}.jpg"), 1)).collect();
        widget.handle_event(WidgetEvent::FilesPicked(batch));

        assert_eq!(widget.selection().len(), 0);
        assert_eq!(
            widget.status().text,
            "No more than 10 images allowed per analysis."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_inside_the_window_send_one_request() {
        let (mut widget, mut events, transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(events.try_recv().is_err());

        // Second pick restarts the window; the first timer never fires.
        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("b.jpg", 1)]));
        pump_one(&mut widget, &mut events).await; // the one surviving settle
        assert_eq!(transport.requests_sent(), 1);
        pump_one(&mut widget, &mut events).await;

        assert_eq!(widget.view().status.tone, StatusTone::Success);
        assert_eq!(transport.requests_sent(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_request_cannot_alter_state() {
        let (mut widget, mut events, transport) = widget(
            vec![accepted(SESSION_A, "STALE"), accepted(SESSION_B, "FRESH")],
            Duration::from_millis(200),
        );

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        pump_one(&mut widget, &mut events).await; // settle -> request 1 in flight
        assert_eq!(transport.requests_sent(), 1);

        // Mutate while request 1 is in flight: its completion must be inert.
        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("b.jpg", 1)]));
        assert_eq!(widget.session_token(), None);

        // Request 1 settles before the new window elapses; the widget must
        // process and discard it without touching token, form, or status.
        pump_one(&mut widget, &mut events).await;
        assert_eq!(widget.session_token(), None);
        assert_eq!(widget.form().serial_number.value(), "");
        assert_eq!(widget.view().status.tone, StatusTone::Progress);

        pump_one(&mut widget, &mut events).await; // settle -> request 2
        assert_eq!(transport.requests_sent(), 2);
        pump_one(&mut widget, &mut events).await; // request 2 settles

        assert_eq!(widget.session_token(), Some(&session(SESSION_B)));
        assert_eq!(widget.form().serial_number.value(), "FRESH");
        assert_eq!(widget.view().status.tone, StatusTone::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_unbinds_token_immediately() {
        let (mut widget, mut events, _transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![
            photo("a.jpg", 1),
            photo("b.jpg", 1),
        ]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;
        assert_eq!(widget.session_token(), Some(&session(SESSION_A)));

        let ids = widget.selection().ids();
        widget.handle_event(WidgetEvent::RemovePhoto(ids[0]));
        assert_eq!(widget.session_token(), None);
        // With the token unbound, submission falls back to raw files.
        assert!(matches!(
            widget.view().submission,
            SubmissionPlan::RawFiles { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn removing_the_last_photo_stands_everything_down() {
        let (mut widget, mut events, transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("only.jpg", 1)]));
        let ids = widget.selection().ids();
        widget.handle_event(WidgetEvent::RemovePhoto(ids[0]));

        assert!(widget.selection().is_empty());
        assert_eq!(widget.session_token(), None);
        assert!(widget.status().is_neutral());
        assert_eq!(widget.live_previews(), 0);

        // The pending timer was canceled: nothing ever fires.
        tokio::time::sleep(Duration::from_secs(2)).await;
        pump_ready(&mut widget, &mut events);
        assert_eq!(transport.requests_sent(), 0);
        assert_eq!(widget.view().submission, SubmissionPlan::Nothing);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_mid_flight_cancels_and_reports_info() {
        let (mut widget, mut events, transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::from_secs(10));

        widget.handle_event(WidgetEvent::FilesPicked(vec![
            photo("a.jpg", 1),
            photo("b.jpg", 1),
        ]));
        pump_one(&mut widget, &mut events).await; // settle -> request in flight
        assert_eq!(transport.requests_sent(), 1);

        widget.handle_event(WidgetEvent::ClearAll);
        let view = widget.view();
        assert_eq!(view.thumbnails.len(), 0);
        assert_eq!(view.status.tone, StatusTone::Info);
        assert!(view.status.text.starts_with("Photos cleared"));
        assert_eq!(widget.live_previews(), 0);
        assert_eq!(widget.session_token(), None);

        // Wait far past the transport delay: the aborted request stays inert.
        tokio::time::sleep(Duration::from_secs(30)).await;
        pump_ready(&mut widget, &mut events);
        assert_eq!(widget.view().status.tone, StatusTone::Info);
        assert_eq!(widget.session_token(), None);
        assert_eq!(transport.requests_sent(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_clears_token_and_shows_server_message() {
        let (mut widget, mut events, _transport) = widget(
            vec![
                accepted(SESSION_A, "SN1"),
                AnalysisOutcome::Rejected {
                    message: Some("Pallet is closed.".to_string()),
                },
            ],
            Duration::ZERO,
        );

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;
        assert_eq!(widget.session_token(), Some(&session(SESSION_A)));

        // Another mutation, and this time the server refuses.
        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("b.jpg", 1)]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;

        assert_eq!(widget.session_token(), None);
        assert_eq!(widget.status().tone, StatusTone::Error);
        assert_eq!(widget.status().text, "Pallet is closed.");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_shows_generic_network_error() {
        let (mut widget, mut events, _transport) =
            widget(vec![AnalysisOutcome::Unreachable], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;

        assert_eq!(widget.session_token(), None);
        assert_eq!(widget.status().tone, StatusTone::Error);
        assert_eq!(widget.status().text, MSG_NETWORK_FAILURE);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_server_message_falls_back_to_generic_text() {
        let (mut widget, mut events, _transport) = widget(
            vec![AnalysisOutcome::Rejected {
                message: Some("   ".to_string()),
            }],
            Duration::ZERO,
        );

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;

        assert_eq!(widget.status().text, MSG_GENERIC_FAILURE);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_returns_to_pristine_state() {
        let (mut widget, mut events, _transport) =
            widget(vec![accepted(SESSION_A, "SN1")], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("a.jpg", 1)]));
        pump_one(&mut widget, &mut events).await;
        pump_one(&mut widget, &mut events).await;

        widget.handle_event(WidgetEvent::Reset);
        assert!(widget.selection().is_empty());
        assert_eq!(widget.live_previews(), 0);
        assert_eq!(widget.session_token(), None);
        assert!(widget.status().is_neutral());
    }

    #[tokio::test(start_paused = true)]
    async fn preview_handles_track_selection_through_a_busy_session() {
        let (mut widget, mut events, _transport) = widget(vec![], Duration::ZERO);

        widget.handle_event(WidgetEvent::FilesPicked(vec![
            photo("a.jpg", 1),
            photo("b.jpg", 1),
            photo("c.jpg", 1),
        ]));
        assert_eq!(widget.live_previews(), widget.selection().len());

        let ids = widget.selection().ids();
        widget.handle_event(WidgetEvent::RemovePhoto(ids[1]));
        assert_eq!(widget.live_previews(), widget.selection().len());

        widget.handle_event(WidgetEvent::FilesPicked(vec![photo("d.jpg", 1)]));
        assert_eq!(widget.live_previews(), widget.selection().len());

        widget.handle_event(WidgetEvent::ClearAll);
        assert_eq!(widget.live_previews(), 0);
        pump_ready(&mut widget, &mut events);
        assert_eq!(widget.live_previews(), widget.selection().len());
    }
}
