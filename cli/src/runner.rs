//! Headless widget driver.
//!
//! The CLI has no competing user events, so the loop is simple: feed the
//! picked files in, then pump the widget's own events until the status leaves
//! the scheduling/progress phase.

use std::time::Duration;

use anyhow::Context;
use intake_protocol::StatusTone;
use intake_widget::AnalysisTransport;
use intake_widget::PhotoFile;
use intake_widget::PhotoIntake;
use intake_widget::WidgetEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// How long we are willing to wait for the debounce plus one full analysis
/// round trip before giving up.
const SETTLEMENT_DEADLINE: Duration = Duration::from_secs(180);

/// Feed `files` to the widget and pump events until analysis settles (or is
/// locally rejected). On return the widget's status and form reflect the
/// final outcome.
pub async fn run_to_settlement<T: AnalysisTransport>(
    widget: &mut PhotoIntake<T>,
    events: &mut UnboundedReceiver<WidgetEvent>,
    files: Vec<PhotoFile>,
) -> anyhow::Result<()> {
    widget.handle_event(WidgetEvent::FilesPicked(files));
    if widget.status().tone == StatusTone::Error || widget.selection().is_empty() {
        // Local limit reject or nothing usable picked: nothing was scheduled,
        // nothing to wait for.
        return Ok(());
    }

    loop {
        let event = tokio::time::timeout(SETTLEMENT_DEADLINE, events.recv())
            .await
            .context("timed out waiting for photo analysis to settle")?
            .context("widget event channel closed")?;
        widget.handle_event(event);

        match widget.status().tone {
            StatusTone::Progress => continue,
            _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_protocol::SessionId;
    use intake_protocol::SuggestionSet;
    use intake_widget::AnalysisOutcome;
    use intake_widget::IntakeConfig;
    use intake_widget::PhotoPart;
    use intake_widget::ProductForm;
    use pretty_assertions::assert_eq;
    use std::future::Future;

    struct OneShotTransport {
        outcome: AnalysisOutcome,
    }

    impl AnalysisTransport for OneShotTransport {
        fn analyze(&self, _photos: Vec<PhotoPart>) -> impl Future<Output = AnalysisOutcome> + Send {
            let outcome = self.outcome.clone();
            async move { outcome }
        }
    }

    fn photo(name: &str, len: usize) -> PhotoFile {
        PhotoFile::new(name, vec![0u8; len])
    }

    #[tokio::test(start_paused = true)]
    async fn runs_through_a_successful_analysis() {
        let session = SessionId::parse("0123456789abcdef0123456789abcdef").expect("session");
        let transport = OneShotTransport {
            outcome: AnalysisOutcome::Accepted {
                session: session.clone(),
                suggestions: SuggestionSet::default(),
            },
        };
        let (mut widget, mut events) = PhotoIntake::new(
            IntakeConfig::default(),
            ProductForm::default(),
            transport,
        );

        run_to_settlement(&mut widget, &mut events, vec![photo("a.jpg", 16)])
            .await
            .expect("settles");

        assert_eq!(widget.status().tone, StatusTone::Success);
        assert_eq!(widget.session_token(), Some(&session));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_on_local_reject() {
        let transport = OneShotTransport {
            outcome: AnalysisOutcome::Unreachable,
        };
        let (mut widget, mut events) = PhotoIntake::new(
            IntakeConfig::default(),
            ProductForm::default(),
            transport,
        );

        let batch: Vec<PhotoFile> = (0..11).map(|i| photo(&format!("p{i}.jpg"), 1)).collect();
        run_to_settlement(&mut widget, &mut events, batch)
            .await
            .expect("returns");

        assert_eq!(widget.status().tone, StatusTone::Error);
        assert!(widget.selection().is_empty());
    }
}
