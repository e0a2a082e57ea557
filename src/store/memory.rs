//! In-memory store, used by tests and the walkthrough demo

use std::collections::HashMap;
use std::sync::RwLock;

use super::{DocumentStore, StoreResult};
use crate::error::StoreError;
use crate::types::{Batch, Code, NewReport, NotificationSettings, Report};
use crate::utils;

pub struct MemoryStore {
    codes: RwLock<HashMap<String, Code>>,
    batches: RwLock<HashMap<String, Batch>>,
    reports: RwLock<HashMap<String, Report>>,
    settings: RwLock<HashMap<String, NotificationSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            batches: RwLock::new(HashMap::new()),
            reports: RwLock::new(HashMap::new()),
            settings: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored reports across all codes
    pub fn report_count(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl DocumentStore for MemoryStore {
    fn get_code(&self, id: &str) -> StoreResult<Option<Code>> {
        Ok(self.codes.read().map_err(poisoned)?.get(id).cloned())
    }

    fn put_code(&self, code: &Code) -> StoreResult<()> {
        self.codes
            .write()
            .map_err(poisoned)?
            .insert(code.id.clone(), code.clone());
        Ok(())
    }

    fn get_batch(&self, id: &str) -> StoreResult<Option<Batch>> {
        Ok(self.batches.read().map_err(poisoned)?.get(id).cloned())
    }

    fn put_batch(&self, batch: &Batch) -> StoreResult<()> {
        self.batches
            .write()
            .map_err(poisoned)?
            .insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    fn get_report(&self, id: &str) -> StoreResult<Option<Report>> {
        Ok(self.reports.read().map_err(poisoned)?.get(id).cloned())
    }

    fn put_report(&self, report: &Report) -> StoreResult<()> {
        self.reports
            .write()
            .map_err(poisoned)?
            .insert(report.id.clone(), report.clone());
        Ok(())
    }

    fn create_report(&self, report: NewReport) -> StoreResult<Report> {
        let id = utils::new_report_id().map_err(|e| StoreError::IdGeneration(e.to_string()))?;
        let report = report.with_id(id);
        self.put_report(&report)?;
        Ok(report)
    }

    fn latest_report_for_code(&self, code: &str) -> StoreResult<Option<Report>> {
        let reports = self.reports.read().map_err(poisoned)?;
        let latest = reports
            .values()
            .filter(|r| r.code == code)
            .max_by(|a, b| {
                a.reported_at
                    .cmp(&b.reported_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned();
        Ok(latest)
    }

    fn get_notification_settings(&self, user_id: &str) -> StoreResult<Option<NotificationSettings>> {
        Ok(self.settings.read().map_err(poisoned)?.get(user_id).copied())
    }

    fn put_notification_settings(
        &self,
        user_id: &str,
        settings: &NotificationSettings,
    ) -> StoreResult<()> {
        self.settings
            .write()
            .map_err(poisoned)?
            .insert(user_id.to_string(), *settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodeStatus, FoundDate, ReportStatus, TimeStamp};

    fn new_report(code: &str, reported_at: TimeStamp<chrono::Utc>) -> NewReport {
        NewReport {
            code: code.to_string(),
            code_id: code.to_string(),
            batch_id: None,
            product_type: None,
            finder_name: "Alex".to_string(),
            finder_email: "alex@example.com".to_string(),
            finder_phone: None,
            location_found: "Gate 5".to_string(),
            found_date: FoundDate::parse("2024-01-01").unwrap(),
            message: None,
            latitude: None,
            longitude: None,
            photos: vec![],
            status: ReportStatus::Pending,
            reported_at,
            owner_notified: false,
            owner_contacted_finder: false,
            resolved_at: None,
        }
    }

    #[test]
    fn latest_report_uses_reported_at_ordering() {
        let store = MemoryStore::new();
        let older = TimeStamp::new_with(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = TimeStamp::new_with(2024, 3, 1, 0, 0, 0).unwrap();

        // insert the newer one first so insertion order can't be what wins
        let second = store.create_report(new_report("IFL-A1", newer)).unwrap();
        let _first = store.create_report(new_report("IFL-A1", older)).unwrap();
        store.create_report(new_report("IFL-B2", TimeStamp::new())).unwrap();

        let latest = store.latest_report_for_code("IFL-A1").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(store.report_count(), 3);
    }

    #[test]
    fn codes_round_trip_by_id() {
        let store = MemoryStore::new();
        store.put_code(&Code::new("IFL-A1", CodeStatus::Available)).unwrap();

        assert!(store.get_code("IFL-A1").unwrap().is_some());
        assert!(store.get_code("IFL-A2").unwrap().is_none());
        assert!(store.latest_report_for_code("IFL-A1").unwrap().is_none());
    }
}
