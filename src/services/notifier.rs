//! Post-commit notification pipeline. The lifecycle engine emits events onto
//! an in-process channel after the state mutation has been persisted; a
//! spawned worker resolves recipients and hands the event to a
//! `NotificationGateway`. Delivery is best-effort: every failure on this path
//! is logged and swallowed, never surfaced to the caller of the lifecycle
//! operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{application::Application, score::ScoreSummary, user::User};
use crate::repository::Repository;
use crate::utils::logger::LOGGER;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    Submission { application: Application },
    HrAlert { application: Application },
    Approval { application: Application },
    Rejection { application: Application },
    Schedule { application: Application },
    Reschedule { application: Application },
    Results { application: Application, summary: ScoreSummary },
    InterviewSchedule { application: Application },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Submission { .. } => "submission",
            NotificationEvent::HrAlert { .. } => "hr_alert",
            NotificationEvent::Approval { .. } => "approval",
            NotificationEvent::Rejection { .. } => "rejection",
            NotificationEvent::Schedule { .. } => "schedule",
            NotificationEvent::Reschedule { .. } => "reschedule",
            NotificationEvent::Results { .. } => "results",
            NotificationEvent::InterviewSchedule { .. } => "interview_schedule",
        }
    }

    pub fn application(&self) -> &Application {
        match self {
            NotificationEvent::Submission { application }
            | NotificationEvent::HrAlert { application }
            | NotificationEvent::Approval { application }
            | NotificationEvent::Rejection { application }
            | NotificationEvent::Schedule { application }
            | NotificationEvent::Reschedule { application }
            | NotificationEvent::Results { application, .. }
            | NotificationEvent::InterviewSchedule { application } => application,
        }
    }

    /// HR alerts fan out to the HR staff; everything else goes to the
    /// applicant who owns the application.
    pub fn is_hr_bound(&self) -> bool {
        matches!(self, NotificationEvent::HrAlert { .. })
    }
}

/// Sending half of the notification channel held by the lifecycle engine.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<NotificationEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Fire-and-forget emit. A closed channel means the notifier worker is
    /// gone; the transition has already committed, so this only logs.
    pub fn emit(&self, event: NotificationEvent) {
        let kind = event.kind();
        let application_id = event.application().id;
        if self.tx.send(event).is_err() {
            tracing::warn!(
                kind,
                application_id,
                "notification channel closed, event dropped"
            );
        }
    }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(
        &self,
        event: &NotificationEvent,
        recipient: Option<&User>,
    ) -> anyhow::Result<()>;
}

/// Gateway that logs the outbound message instead of delivering it. Stands in
/// for the email/in-app providers, which are wired up outside this service.
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn notify(
        &self,
        event: &NotificationEvent,
        recipient: Option<&User>,
    ) -> anyhow::Result<()> {
        tracing::info!(
            kind = event.kind(),
            application_id = event.application().id,
            recipient = recipient.map(|u| u.email.as_str()),
            payload = %serde_json::to_string(event).unwrap_or_default(),
            "notification dispatched"
        );
        Ok(())
    }
}

/// Consumes lifecycle events and dispatches them through the gateway.
pub struct Notifier<R> {
    repo: Arc<R>,
    gateway: Arc<dyn NotificationGateway>,
}

impl<R: Repository> Notifier<R> {
    pub fn new(repo: Arc<R>, gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { repo, gateway }
    }

    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<NotificationEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(&event).await;
        }
        tracing::info!("notification channel closed, notifier stopping");
    }

    async fn dispatch(&self, event: &NotificationEvent) {
        if event.is_hr_bound() {
            let hr_users = match self.repo.list_hr_users().await {
                Ok(users) => users,
                Err(e) => {
                    log_delivery_failure(event, None, &format!("failed to resolve HR staff: {e}"));
                    return;
                }
            };
            if hr_users.is_empty() {
                if let Err(e) = self.gateway.notify(event, None).await {
                    log_delivery_failure(event, None, &e.to_string());
                }
                return;
            }
            for user in &hr_users {
                if let Err(e) = self.gateway.notify(event, Some(user)).await {
                    log_delivery_failure(event, Some(user), &e.to_string());
                }
            }
            return;
        }

        let applicant = match self.repo.find_user(event.application().applicant_id).await {
            Ok(user) => user,
            Err(e) => {
                log_delivery_failure(event, None, &format!("failed to resolve applicant: {e}"));
                None
            }
        };
        if let Err(e) = self.gateway.notify(event, applicant.as_ref()).await {
            log_delivery_failure(event, applicant.as_ref(), &e.to_string());
        }
    }
}

fn log_delivery_failure(event: &NotificationEvent, recipient: Option<&User>, error: &str) {
    let mut context = HashMap::new();
    context.insert("kind".to_string(), serde_json::Value::from(event.kind()));
    context.insert(
        "application_id".to_string(),
        serde_json::Value::from(event.application().id),
    );
    if let Some(user) = recipient {
        context.insert(
            "recipient".to_string(),
            serde_json::Value::from(user.email.clone()),
        );
    }
    LOGGER.log_error(&format!("notification delivery failed: {error}"), context);
}
