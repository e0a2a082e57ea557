//! Document store abstraction used by the lookup and report services

pub mod memory;
pub mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::error::StoreError;
use crate::types::{Batch, Code, NewReport, NotificationSettings, Report};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Point reads and writes of codes, batches and reports, plus the one query the
/// workflow needs: the most recent report for a code.
pub trait DocumentStore: Send + Sync {
    fn get_code(&self, id: &str) -> StoreResult<Option<Code>>;

    /// Set the code record, replacing any previous version
    fn put_code(&self, code: &Code) -> StoreResult<()>;

    fn get_batch(&self, id: &str) -> StoreResult<Option<Batch>>;

    fn put_batch(&self, batch: &Batch) -> StoreResult<()>;

    fn get_report(&self, id: &str) -> StoreResult<Option<Report>>;

    /// Overwrite an existing report by id
    fn put_report(&self, report: &Report) -> StoreResult<()>;

    /// Persist a new report under a store generated identifier
    fn create_report(&self, report: NewReport) -> StoreResult<Report>;

    /// Reports whose `code` equals `code`, latest `reported_at` first, limit one
    fn latest_report_for_code(&self, code: &str) -> StoreResult<Option<Report>>;

    fn get_notification_settings(&self, user_id: &str) -> StoreResult<Option<NotificationSettings>>;

    fn put_notification_settings(
        &self,
        user_id: &str,
        settings: &NotificationSettings,
    ) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn get_code(&self, id: &str) -> StoreResult<Option<Code>> {
        (**self).get_code(id)
    }
    fn put_code(&self, code: &Code) -> StoreResult<()> {
        (**self).put_code(code)
    }
    fn get_batch(&self, id: &str) -> StoreResult<Option<Batch>> {
        (**self).get_batch(id)
    }
    fn put_batch(&self, batch: &Batch) -> StoreResult<()> {
        (**self).put_batch(batch)
    }
    fn get_report(&self, id: &str) -> StoreResult<Option<Report>> {
        (**self).get_report(id)
    }
    fn put_report(&self, report: &Report) -> StoreResult<()> {
        (**self).put_report(report)
    }
    fn create_report(&self, report: NewReport) -> StoreResult<Report> {
        (**self).create_report(report)
    }
    fn latest_report_for_code(&self, code: &str) -> StoreResult<Option<Report>> {
        (**self).latest_report_for_code(code)
    }
    fn get_notification_settings(&self, user_id: &str) -> StoreResult<Option<NotificationSettings>> {
        (**self).get_notification_settings(user_id)
    }
    fn put_notification_settings(
        &self,
        user_id: &str,
        settings: &NotificationSettings,
    ) -> StoreResult<()> {
        (**self).put_notification_settings(user_id, settings)
    }
}
