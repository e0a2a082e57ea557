//! Sled backed document store
//!
//! All records live in the default tree under a collection prefix, encoded as CBOR:
//!
//! - `codes/<id>`, `batches/<id>`, `reports/<id>`, `notification_settings/<user id>`
//! - `reports_by_code/<code>\0<reported_at nanos, big endian><report id>` -> report id
//!
//! The index key sorts by time within a code, so the latest report for a code is
//! the last key under its prefix.
use super::{DocumentStore, StoreResult};
use crate::error::StoreError;
use crate::types::{Batch, Code, NewReport, NotificationSettings, Report};
use crate::utils;
use sled::Batch as WriteBatch;
use std::sync::Arc;

const CODES: &str = "codes/";
const BATCHES: &str = "batches/";
const REPORTS: &str = "reports/";
const REPORTS_BY_CODE: &str = "reports_by_code/";
const SETTINGS: &str = "notification_settings/";

pub struct SledStore {
    instance: Arc<sled::Db>,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Ok(Self::new(Arc::new(db)))
    }

    fn key(collection: &str, id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(collection.len() + id.len());
        key.extend_from_slice(collection.as_bytes());
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn code_index_prefix(code: &str) -> Vec<u8> {
        let mut key = Self::key(REPORTS_BY_CODE, code);
        key.push(0);
        key
    }

    fn code_index_key(report: &Report) -> Vec<u8> {
        let mut key = Self::code_index_prefix(&report.code);
        // pre-epoch timestamps clamp to zero, they only occur in hand built fixtures
        let nanos = report
            .reported_at
            .to_datetime_utc()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .max(0) as u64;
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(report.id.as_bytes());
        key
    }

    fn load<T>(&self, collection: &str, id: &str) -> StoreResult<Option<T>>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        match self.instance.get(Self::key(collection, id))? {
            Some(bytes) => {
                let value =
                    minicbor::decode(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn save<T>(&self, collection: &str, id: &str, value: &T) -> StoreResult<()>
    where
        T: minicbor::Encode<()>,
    {
        let cbor = encode(value)?;
        self.instance.insert(Self::key(collection, id), cbor)?;
        Ok(())
    }
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> StoreResult<Vec<u8>> {
    minicbor::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

impl DocumentStore for SledStore {
    fn get_code(&self, id: &str) -> StoreResult<Option<Code>> {
        self.load(CODES, id)
    }

    fn put_code(&self, code: &Code) -> StoreResult<()> {
        self.save(CODES, &code.id, code)
    }

    fn get_batch(&self, id: &str) -> StoreResult<Option<Batch>> {
        self.load(BATCHES, id)
    }

    fn put_batch(&self, batch: &Batch) -> StoreResult<()> {
        self.save(BATCHES, &batch.id, batch)
    }

    fn get_report(&self, id: &str) -> StoreResult<Option<Report>> {
        self.load(REPORTS, id)
    }

    fn put_report(&self, report: &Report) -> StoreResult<()> {
        self.save(REPORTS, &report.id, report)
    }

    fn create_report(&self, report: NewReport) -> StoreResult<Report> {
        let id = utils::new_report_id().map_err(|e| StoreError::IdGeneration(e.to_string()))?;
        let report = report.with_id(id);

        // record and index land together or not at all
        let mut batch = WriteBatch::default();
        batch.insert(Self::key(REPORTS, &report.id), encode(&report)?);
        batch.insert(Self::code_index_key(&report), report.id.as_bytes());
        self.instance.apply_batch(batch)?;

        Ok(report)
    }

    fn latest_report_for_code(&self, code: &str) -> StoreResult<Option<Report>> {
        let latest = self
            .instance
            .scan_prefix(Self::code_index_prefix(code))
            .next_back()
            .transpose()?;

        match latest {
            Some((_, report_id)) => {
                let report_id = String::from_utf8(report_id.to_vec())
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                self.get_report(&report_id)
            }
            None => Ok(None),
        }
    }

    fn get_notification_settings(&self, user_id: &str) -> StoreResult<Option<NotificationSettings>> {
        self.load(SETTINGS, user_id)
    }

    fn put_notification_settings(
        &self,
        user_id: &str,
        settings: &NotificationSettings,
    ) -> StoreResult<()> {
        self.save(SETTINGS, user_id, settings)
    }
}
