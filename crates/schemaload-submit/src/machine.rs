use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use schemaload_client::ConfigClient;
use schemaload_core::{ValidationIssue, check_document, parse_document};

use crate::proceed::Proceed;
use crate::status::SubmissionStatus;

/// Result of a `submit()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another attempt was in flight; nothing happened.
    Ignored,
    /// The attempt ran to a terminal status.
    Resolved(SubmissionStatus),
}

const ABANDONED_MESSAGE: &str = "submission abandoned";

#[derive(Debug, Default)]
struct Buffer {
    raw_text: String,
    last_issues: Vec<ValidationIssue>,
}

/// Owns the editable document text and drives one submission attempt at a
/// time through parse, validate, and transmit.
///
/// `submit()` takes `&self`; the in-flight guard is the status transition
/// itself, taken atomically on the watch channel, so concurrent callers get
/// `SubmitOutcome::Ignored` instead of a second attempt. Dropping a `submit()`
/// future mid-attempt resolves it as `Failed("submission abandoned")`.
pub struct Submission<C, P> {
    client: C,
    proceed: Mutex<P>,
    status: watch::Sender<SubmissionStatus>,
    buffer: Mutex<Buffer>,
}

impl<C, P> Submission<C, P>
where
    C: ConfigClient,
    P: Proceed,
{
    pub fn new(client: C, proceed: P) -> Self {
        Self::with_text(client, proceed, String::new())
    }

    /// Create a machine whose buffer starts with `text`.
    pub fn with_text(client: C, proceed: P, text: impl Into<String>) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            client,
            proceed: Mutex::new(proceed),
            status,
            buffer: Mutex::new(Buffer {
                raw_text: text.into(),
                last_issues: Vec::new(),
            }),
        }
    }

    /// Replace the buffer. An attempt already in flight keeps its snapshot.
    pub fn set_text(&self, text: impl Into<String>) {
        self.lock_buffer().raw_text = text.into();
    }

    pub fn text(&self) -> String {
        self.lock_buffer().raw_text.clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    /// Every validation error of the last attempt, in check order.
    pub fn last_issues(&self) -> Vec<ValidationIssue> {
        self.lock_buffer().last_issues.clone()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.status.borrow().error_message().map(str::to_string)
    }

    /// Run one submission attempt over the current buffer.
    pub async fn submit(&self) -> SubmitOutcome {
        let accepted = self.status.send_if_modified(|status| {
            if status.is_in_flight() {
                return false;
            }
            *status = SubmissionStatus::Parsing;
            true
        });

        if !accepted {
            tracing::debug!(event = "submission_ignored", status = %self.status());
            return SubmitOutcome::Ignored;
        }

        let text = {
            let mut buffer = self.lock_buffer();
            buffer.last_issues.clear();
            buffer.raw_text.clone()
        };

        let guard = AttemptGuard {
            status: &self.status,
        };
        let attempt_id = Uuid::new_v4();
        let status = self
            .run(text)
            .instrument(tracing::info_span!("submission", attempt_id = %attempt_id))
            .await;
        drop(guard);

        SubmitOutcome::Resolved(status)
    }

    async fn run(&self, text: String) -> SubmissionStatus {
        tracing::info!(event = "submission_started", bytes = text.len());

        let document = match parse_document(&text) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(event = "document_rejected", error = %err);
                return self.fail(err.to_string());
            }
        };

        tracing::info!(
            event = "document_parsed",
            databases = document.databases.len(),
            tables = document.tables.len()
        );
        self.transition(SubmissionStatus::Validating);

        let validated = match check_document(document) {
            Ok(validated) => validated,
            Err(report) => {
                let message = report
                    .first_error()
                    .map(|issue| issue.message.clone())
                    .unwrap_or_else(|| "document failed validation".to_string());
                for issue in &report.errors {
                    tracing::warn!(
                        event = "validation_issue",
                        path = %issue.path,
                        rule = %issue.rule,
                        message = %issue.message
                    );
                }
                tracing::warn!(event = "validation_failed", issues = report.errors.len());
                self.lock_buffer().last_issues = report.errors;
                return self.fail(message);
            }
        };

        for warning in &validated.warnings {
            tracing::warn!(
                event = "validation_warning",
                path = %warning.path,
                rule = %warning.rule,
                message = %warning.message
            );
        }

        self.transition(SubmissionStatus::Submitting);
        tracing::info!(event = "config_load_sent");

        match self.client.load(validated.document).await {
            Ok(ack) => {
                tracing::info!(event = "submission_succeeded", ok = ?ack.ok);
                self.transition(SubmissionStatus::Succeeded);
                self.proceed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .proceed();
                SubmissionStatus::Succeeded
            }
            Err(err) => {
                tracing::warn!(event = "config_load_failed", error = %err);
                self.fail(err.message())
            }
        }
    }

    fn transition(&self, next: SubmissionStatus) {
        self.status.send_replace(next);
    }

    fn fail(&self, message: String) -> SubmissionStatus {
        let failed = SubmissionStatus::Failed(message);
        self.transition(failed.clone());
        failed
    }

    fn lock_buffer(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the in-flight status if a `submit()` future is dropped before the
/// attempt resolves.
struct AttemptGuard<'a> {
    status: &'a watch::Sender<SubmissionStatus>,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let abandoned = self.status.send_if_modified(|status| {
            if !status.is_in_flight() {
                return false;
            }
            *status = SubmissionStatus::Failed(ABANDONED_MESSAGE.to_string());
            true
        });
        if abandoned {
            tracing::warn!(event = "submission_abandoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use schemaload_client::{Ack, LoadError};
    use schemaload_core::SchemaDocument;

    use super::*;

    const VALID: &str = r#"{"databases":{"db1":{"host":"h","port":5432,"user":"u","password":"p","database":"d"}},"tables":{"t1":{"db":"db1","columns":["id"],"relations":{}}}}"#;

    struct FakeClient {
        calls: Arc<AtomicUsize>,
        response: Result<Ack, LoadError>,
    }

    impl FakeClient {
        fn ok(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                response: Ok(Ack { ok: Some(true) }),
            }
        }
    }

    #[async_trait]
    impl ConfigClient for FakeClient {
        async fn load(&self, _document: SchemaDocument) -> Result<Ack, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.response.clone()
        }
    }

    struct HangingClient {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConfigClient for HangingClient {
        async fn load(&self, _document: SchemaDocument) -> Result<Ack, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn proceed_counter(count: Arc<AtomicUsize>) -> impl FnMut() + Send {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let machine = Submission::new(FakeClient::ok(counter()), || {});
        assert_eq!(machine.status(), SubmissionStatus::Idle);
        assert_eq!(machine.last_error_message(), None);
        assert!(machine.last_issues().is_empty());
    }

    #[tokio::test]
    async fn valid_document_succeeds_and_proceeds_once() {
        let calls = counter();
        let proceeded = counter();
        let machine = Submission::with_text(
            FakeClient::ok(calls.clone()),
            proceed_counter(proceeded.clone()),
            VALID,
        );

        let outcome = machine.submit().await;

        assert_eq!(outcome, SubmitOutcome::Resolved(SubmissionStatus::Succeeded));
        assert_eq!(machine.status(), SubmissionStatus::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(proceeded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn syntax_error_never_reaches_client() {
        let calls = counter();
        let proceeded = counter();
        let machine = Submission::with_text(
            FakeClient::ok(calls.clone()),
            proceed_counter(proceeded.clone()),
            r#"{"databases":"#,
        );

        machine.submit().await;

        let message = machine.last_error_message().expect("failure message");
        assert!(message.starts_with("invalid document syntax: "), "{message}");
        assert!(machine.last_issues().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(proceeded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_failure_keeps_every_issue() {
        let calls = counter();
        let machine = Submission::with_text(
            FakeClient::ok(calls.clone()),
            || {},
            r#"{"databases":{},"tables":{
                "a":{"db":"x","columns":["id"]},
                "b":{"db":"y","columns":["id"]}}}"#,
        );

        machine.submit().await;

        let issues = machine.last_issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(
            machine.last_error_message().as_deref(),
            Some(issues[0].message.as_str())
        );
        assert!(issues[0].message.contains("'x'"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejection_message_is_surfaced() {
        let client = FakeClient {
            calls: counter(),
            response: Err(LoadError::Rejected {
                message: "duplicate table name".to_string(),
            }),
        };
        let proceeded = counter();
        let machine = Submission::with_text(client, proceed_counter(proceeded.clone()), VALID);

        let outcome = machine.submit().await;

        assert_eq!(
            outcome,
            SubmitOutcome::Resolved(SubmissionStatus::Failed("duplicate table name".to_string()))
        );
        assert_eq!(proceeded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_submit_is_ignored() {
        let calls = counter();
        let machine = Submission::with_text(FakeClient::ok(calls.clone()), || {}, VALID);

        let (first, second) = tokio::join!(machine.submit(), machine.submit());

        let outcomes = [first, second];
        let ignored = outcomes
            .iter()
            .filter(|outcome| **outcome == SubmitOutcome::Ignored)
            .count();
        assert_eq!(ignored, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(machine.status(), SubmissionStatus::Succeeded);
    }

    #[tokio::test]
    async fn retry_after_edit_clears_previous_failure() {
        let calls = counter();
        let proceeded = counter();
        let machine = Submission::with_text(
            FakeClient::ok(calls.clone()),
            proceed_counter(proceeded.clone()),
            r#"{"databases":{},"tables":{"t1":{"db":"db2","columns":["id"]}}}"#,
        );

        machine.submit().await;
        assert!(machine.status().error_message().is_some());
        assert_eq!(machine.last_issues().len(), 1);

        machine.set_text(VALID);
        let mut updates = machine.subscribe();
        let outcome = machine.submit().await;

        assert_eq!(outcome, SubmitOutcome::Resolved(SubmissionStatus::Succeeded));
        assert!(machine.last_issues().is_empty());
        assert_eq!(machine.last_error_message(), None);
        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(*updates.borrow_and_update(), SubmissionStatus::Succeeded);

        machine.submit().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(proceeded.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_attempt_releases_in_flight_status() {
        let calls = counter();
        let proceeded = counter();
        let machine = Submission::with_text(
            HangingClient {
                calls: calls.clone(),
            },
            proceed_counter(proceeded.clone()),
            VALID,
        );

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(50), machine.submit()).await;
        assert!(timed_out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            machine.status(),
            SubmissionStatus::Failed("submission abandoned".to_string())
        );

        machine.set_text("{bad");
        let outcome = machine.submit().await;

        match outcome {
            SubmitOutcome::Resolved(SubmissionStatus::Failed(message)) => {
                assert!(message.starts_with("invalid document syntax: "), "{message}");
            }
            other => panic!("expected a resolved failure, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(proceeded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_resolves_to_failed() {
        let client = FakeClient {
            calls: counter(),
            response: Err(LoadError::Network("connection refused".to_string())),
        };
        let proceeded = counter();
        let machine = Submission::with_text(client, proceed_counter(proceeded.clone()), VALID);

        let outcome = machine.submit().await;

        assert_eq!(
            outcome,
            SubmitOutcome::Resolved(SubmissionStatus::Failed(
                "network error: connection refused".to_string()
            ))
        );
        assert_eq!(
            machine.last_error_message().as_deref(),
            Some("network error: connection refused")
        );
        assert!(machine.last_issues().is_empty());
        assert_eq!(proceeded.load(Ordering::SeqCst), 0);
    }
}
