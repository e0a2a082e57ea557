//! Owner notification through a callable remote function
use crate::error::NotifyError;
use crate::store::DocumentStore;
use crate::types::{NotificationSettings, TimeStamp};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    ItemFound,
    ItemRecovered,
    ReportUpdate,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ItemFound => "item_found",
            NotificationType::ItemRecovered => "item_recovered",
            NotificationType::ReportUpdate => "report_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub recipient_id: String,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallResponse {
    pub success: bool,
}

/// A plain email, sent when the notification function can't be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub message: String,
}

/// The remote `sendNotification` and `sendEmail` functions
pub trait Notifier: Send + Sync {
    fn call(&self, payload: &NotificationPayload) -> Result<CallResponse, NotifyError>;

    /// Direct email. Exposes the recipient address to the caller, so it is only a fallback.
    fn send_email(&self, email: &EmailMessage) -> Result<CallResponse, NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn call(&self, payload: &NotificationPayload) -> Result<CallResponse, NotifyError> {
        (**self).call(payload)
    }
    fn send_email(&self, email: &EmailMessage) -> Result<CallResponse, NotifyError> {
        (**self).send_email(email)
    }
}

/// Notifier that only logs, for development
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn call(&self, payload: &NotificationPayload) -> Result<CallResponse, NotifyError> {
        info!(
            recipient = %payload.recipient_id,
            kind = payload.kind.as_str(),
            title = %payload.title,
            "{}",
            payload.message
        );
        Ok(CallResponse { success: true })
    }

    fn send_email(&self, email: &EmailMessage) -> Result<CallResponse, NotifyError> {
        info!(to = %email.to, subject = %email.subject, "{}", email.message);
        Ok(CallResponse { success: true })
    }
}

pub struct NotificationService<S, N> {
    store: S,
    notifier: N,
}

impl<S: DocumentStore, N: Notifier> NotificationService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Tell the owner of `code_id` that `report_id` was filed.
    ///
    /// On a successful call the report is marked `owner_notified`. Returns whether
    /// the remote function reported success.
    pub fn send_item_found(&self, report_id: &str, code_id: &str) -> Result<bool, NotifyError> {
        let mut report = self
            .store
            .get_report(report_id)?
            .ok_or_else(|| NotifyError::ReportNotFound(report_id.to_string()))?;
        let code = self
            .store
            .get_code(code_id)?
            .ok_or_else(|| NotifyError::CodeNotFound(code_id.to_string()))?;
        let owner_id = code
            .owner_id
            .ok_or_else(|| NotifyError::NoOwner(code_id.to_string()))?;

        let location = if report.location_found.is_empty() {
            "an unknown location"
        } else {
            report.location_found.as_str()
        };

        let mut data = BTreeMap::new();
        data.insert("reportId".to_string(), report_id.to_string());
        data.insert("codeId".to_string(), code_id.to_string());
        data.insert("locationFound".to_string(), report.location_found.clone());
        data.insert("foundDate".to_string(), report.found_date.to_string());
        data.insert("finderName".to_string(), report.finder_name.clone());

        let payload = NotificationPayload {
            recipient_id: owner_id,
            kind: NotificationType::ItemFound,
            title: "Your Item Has Been Found!".to_string(),
            message: format!(
                "Someone has found your item with code {code_id} in {location}. Check your account for details."
            ),
            data,
        };

        let response = self.notifier.call(&payload)?;
        if response.success {
            report.owner_notified = true;
            report.owner_notified_at = Some(TimeStamp::new());
            self.store.put_report(&report)?;
            info!(report_id, code_id, "owner notified");
        } else {
            warn!(report_id, code_id, "notification function reported failure");
        }

        Ok(response.success)
    }

    /// Fallback email when the notification function is unavailable.
    /// Returns whether the remote function reported success.
    pub fn send_email_notification(
        &self,
        to: &str,
        subject: &str,
        message: &str,
    ) -> Result<bool, NotifyError> {
        let email = EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        };
        let response = self.notifier.send_email(&email)?;
        if !response.success {
            warn!(to, subject, "email function reported failure");
        }
        Ok(response.success)
    }

    /// Channels `user_id` wants to hear on. Missing settings and store failures
    /// both fall back to email and push.
    pub fn notification_settings(&self, user_id: &str) -> NotificationSettings {
        match self.store.get_notification_settings(user_id) {
            Ok(Some(settings)) => settings,
            Ok(None) => NotificationSettings::default(),
            Err(err) => {
                warn!(user_id, error = %err, "error getting notification settings");
                NotificationSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportInput, ReportService};
    use crate::store::MemoryStore;
    use crate::types::{Code, CodeStatus, FoundDate};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<NotificationPayload>>,
        emails: Mutex<Vec<EmailMessage>>,
        success: bool,
    }

    impl Notifier for Recorder {
        fn call(&self, payload: &NotificationPayload) -> Result<CallResponse, NotifyError> {
            self.calls.lock().unwrap().push(payload.clone());
            Ok(CallResponse {
                success: self.success,
            })
        }

        fn send_email(&self, email: &EmailMessage) -> Result<CallResponse, NotifyError> {
            self.emails.lock().unwrap().push(email.clone());
            Ok(CallResponse {
                success: self.success,
            })
        }
    }

    fn seeded(owner: Option<&str>) -> (Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let mut code = Code::new("IFL-A1", CodeStatus::Assigned);
        if let Some(owner) = owner {
            code = code.assign_to(owner);
        }
        store.put_code(&code).unwrap();

        let id = ReportService::new(store.clone())
            .submit_report(
                ReportInput::new("IFL-A1")
                    .set_finder_name("Alex")
                    .set_finder_email("alex@example.com")
                    .set_location_found("Gate 5")
                    .set_found_date(FoundDate::parse("2024-01-01").unwrap()),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn successful_call_marks_report_notified() {
        let (store, id) = seeded(Some("owner-1"));
        let recorder = Arc::new(Recorder {
            success: true,
            ..Default::default()
        });
        let service = NotificationService::new(store.clone(), recorder.clone());

        assert!(service.send_item_found(&id, "IFL-A1").unwrap());

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].recipient_id, "owner-1");
        assert_eq!(calls[0].kind.as_str(), "item_found");
        assert!(calls[0].message.contains("IFL-A1 in Gate 5"));
        assert_eq!(calls[0].data["foundDate"], "2024-01-01");

        let report = store.get_report(&id).unwrap().unwrap();
        assert!(report.owner_notified);
        assert!(report.owner_notified_at.is_some());
    }

    #[test]
    fn failed_call_leaves_report_untouched() {
        let (store, id) = seeded(Some("owner-1"));
        let service = NotificationService::new(store.clone(), Recorder::default());

        assert!(!service.send_item_found(&id, "IFL-A1").unwrap());
        assert!(!store.get_report(&id).unwrap().unwrap().owner_notified);
    }

    #[test]
    fn unassigned_code_has_no_recipient() {
        let (store, id) = seeded(None);
        let service = NotificationService::new(store, LogNotifier::new());

        assert!(matches!(
            service.send_item_found(&id, "IFL-A1"),
            Err(NotifyError::NoOwner(_))
        ));
        assert!(matches!(
            service.send_item_found("report1nope", "IFL-A1"),
            Err(NotifyError::ReportNotFound(_))
        ));
    }

    #[test]
    fn email_fallback_goes_through_the_notifier() {
        let (store, _) = seeded(Some("owner-1"));
        let recorder = Arc::new(Recorder {
            success: true,
            ..Default::default()
        });
        let service = NotificationService::new(store, recorder.clone());

        let sent = service
            .send_email_notification("owner@example.com", "Item found", "Check your account")
            .unwrap();

        assert!(sent);
        let emails = recorder.emails.lock().unwrap();
        assert_eq!(emails[0].to, "owner@example.com");
        assert_eq!(emails[0].subject, "Item found");
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn settings_default_to_email_and_push() {
        let (store, _) = seeded(Some("owner-1"));
        let service = NotificationService::new(store.clone(), LogNotifier::new());

        let defaults = service.notification_settings("owner-1");
        assert!(defaults.email && defaults.push && !defaults.sms);

        let sms_only = NotificationSettings {
            email: false,
            push: false,
            sms: true,
        };
        store.put_notification_settings("owner-1", &sms_only).unwrap();
        assert_eq!(service.notification_settings("owner-1"), sms_only);
    }
}
