//! Debounced analysis scheduling.
//!
//! At most one settle timer and one in-flight request exist at a time. Every
//! (re)schedule bumps a generation counter; timers and requests echo their
//! generation back through the event channel, and the controller discards
//! events whose generation is no longer current. Superseded tasks are also
//! aborted outright, so a canceled request usually never even resolves — the
//! generation check only mops up completions that were already queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::client::AnalysisTransport;
use crate::client::PhotoPart;
use crate::events::WidgetEvent;

pub struct AnalysisScheduler {
    settle_window: Duration,
    generation: u64,
    settle_task: Option<JoinHandle<()>>,
    inflight_task: Option<JoinHandle<()>>,
    events: UnboundedSender<WidgetEvent>,
}

impl AnalysisScheduler {
    pub fn new(settle_window: Duration, events: UnboundedSender<WidgetEvent>) -> Self {
        Self {
            settle_window,
            generation: 0,
            settle_task: None,
            inflight_task: None,
            events,
        }
    }

    /// Generation of the most recent schedule or cancel. Events carrying an
    /// older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// (Re)start the settle timer, aborting any pending one. Returns the new
    /// generation.
    pub fn schedule(&mut self) -> u64 {
        self.abort_settle();
        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();
        let window = self.settle_window;
        tracing::debug!("settle timer armed (generation {generation})");
        self.settle_task = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = events.send(WidgetEvent::SettleElapsed { generation });
        }));
        generation
    }

    /// Abort the pending timer and the in-flight request, invalidating any
    /// completion that may already be queued.
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.abort_settle();
        self.abort_inflight();
    }

    /// Launch the request for `generation`, aborting any in-flight one first.
    pub fn launch<T: AnalysisTransport>(
        &mut self,
        generation: u64,
        transport: Arc<T>,
        photos: Vec<PhotoPart>,
    ) {
        self.abort_inflight();
        let events = self.events.clone();
        tracing::debug!(
            "analysis request launched ({} photos, generation {generation})",
            photos.len()
        );
        self.inflight_task = Some(tokio::spawn(async move {
            let outcome = transport.analyze(photos).await;
            let _ = events.send(WidgetEvent::AnalysisSettled {
                generation,
                outcome,
            });
        }));
    }

    /// Clear the in-flight marker once the current request's completion has
    /// been applied.
    pub fn request_settled(&mut self) {
        self.inflight_task = None;
    }

    pub fn has_inflight(&self) -> bool {
        self.inflight_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn abort_settle(&mut self) {
        if let Some(task) = self.settle_task.take() {
            task.abort();
        }
    }

    fn abort_inflight(&mut self) {
        if let Some(task) = self.inflight_task.take() {
            task.abort();
        }
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        self.abort_settle();
        self.abort_inflight();
    }
}
