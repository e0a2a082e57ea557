//! Report existence checks and report submission
use crate::code_format::normalize;
use crate::error::{StoreError, SubmissionError};
use crate::store::DocumentStore;
use crate::types::{FoundDate, NewReport, Report, ReportStatus, TimeStamp};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Which record decides whether a code has "already been reported"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistenceStrategy {
    /// Follow the code's `last_report_id` pointer
    LastReportId,
    /// Query reports for the code, most recent `reported_at` wins
    #[default]
    LatestByQuery,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExistingReport {
    pub exists: bool,
    pub report_id: Option<String>,
    pub status: Option<ReportStatus>,
    pub reported_at: Option<TimeStamp<Utc>>,
}

impl ExistingReport {
    pub fn none() -> Self {
        Self::default()
    }

    fn from_report(report: &Report) -> Self {
        Self {
            exists: true,
            report_id: Some(report.id.clone()),
            status: Some(report.status),
            reported_at: Some(report.reported_at.clone()),
        }
    }
}

/// Everything the finder provides, plus the code being reported
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportInput {
    pub code: String,
    pub finder_name: String,
    pub finder_email: String,
    pub finder_phone: Option<String>,
    pub location_found: String,
    pub found_date: Option<FoundDate>,
    pub message: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photos: Vec<String>,
}

// blank optional text is treated as absent
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ReportInput {
    pub fn new(code: &str) -> Self {
        Self {
            code: normalize(code),
            ..Self::default()
        }
    }
    pub fn set_finder_name(mut self, name: &str) -> Self {
        self.finder_name = name.trim().to_string();
        self
    }
    pub fn set_finder_email(mut self, email: &str) -> Self {
        self.finder_email = email.trim().to_string();
        self
    }
    pub fn set_finder_phone(mut self, phone: &str) -> Self {
        self.finder_phone = non_blank(phone);
        self
    }
    pub fn set_location_found(mut self, location: &str) -> Self {
        self.location_found = location.trim().to_string();
        self
    }
    pub fn set_found_date(mut self, date: FoundDate) -> Self {
        self.found_date = Some(date);
        self
    }
    pub fn set_message(mut self, message: &str) -> Self {
        self.message = non_blank(message);
        self
    }
    pub fn set_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
    pub fn add_photo(mut self, url: &str) -> Self {
        self.photos.push(url.to_string());
        self
    }

    /// Checks the fields the store record cannot do without
    pub fn validate(&self) -> Result<FoundDate, SubmissionError> {
        if self.code.is_empty() {
            return Err(SubmissionError::Incomplete("code"));
        }
        if self.finder_name.is_empty() {
            return Err(SubmissionError::Incomplete("finder_name"));
        }
        if self.finder_email.is_empty() {
            return Err(SubmissionError::Incomplete("finder_email"));
        }
        if self.location_found.is_empty() {
            return Err(SubmissionError::Incomplete("location_found"));
        }
        self.found_date.ok_or(SubmissionError::Incomplete("found_date"))
    }
}

pub struct ReportService<S> {
    store: S,
    strategy: ExistenceStrategy,
}

impl<S: DocumentStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            strategy: ExistenceStrategy::default(),
        }
    }

    pub fn with_strategy(store: S, strategy: ExistenceStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> ExistenceStrategy {
        self.strategy
    }

    /// Has this code been reported before? "No" on any store failure, so an
    /// infrastructure hiccup never blocks a finder from submitting.
    pub fn check_existing_report(&self, code: &str) -> ExistingReport {
        let code = normalize(code);
        let found = match self.strategy {
            ExistenceStrategy::LastReportId => self.report_via_code(&code),
            ExistenceStrategy::LatestByQuery => self.store.latest_report_for_code(&code),
        };

        match found {
            Ok(Some(report)) => {
                debug!(code = %code, report_id = %report.id, status = %report.status, "existing report found");
                ExistingReport::from_report(&report)
            }
            Ok(None) => ExistingReport::none(),
            Err(err) => {
                warn!(code = %code, error = %err, "error checking existing report");
                ExistingReport::none()
            }
        }
    }

    fn report_via_code(&self, code: &str) -> Result<Option<Report>, StoreError> {
        let last_report_id = self
            .store
            .get_code(code)?
            .and_then(|record| record.last_report_id);

        match last_report_id {
            Some(id) => self.store.get_report(&id),
            None => Ok(None),
        }
    }

    /// Persist a finder's report and return its identifier.
    ///
    /// Creating the report is the only write that can fail the call. The follow up
    /// bookkeeping on the code record is attempted once and only logged on failure.
    pub fn submit_report(&self, input: ReportInput) -> Result<String, SubmissionError> {
        let found_date = input.validate()?;
        let code = normalize(&input.code);

        let mut record = self
            .store
            .get_code(&code)?
            .ok_or(SubmissionError::InvalidCode)?;
        // may have been disabled after the lookup let the finder through
        if record.is_disabled() {
            warn!(code = %code, "report refused for disabled code");
            return Err(SubmissionError::DisabledCode);
        }

        let reported_at = TimeStamp::new();
        let draft = NewReport {
            code: code.clone(),
            code_id: code.clone(),
            batch_id: record.batch_id.clone(),
            product_type: record.product_type.clone(),
            finder_name: input.finder_name,
            finder_email: input.finder_email,
            finder_phone: input.finder_phone,
            location_found: input.location_found,
            found_date,
            message: input.message,
            latitude: input.latitude,
            longitude: input.longitude,
            photos: input.photos,
            status: ReportStatus::Pending,
            reported_at: reported_at.clone(),
            owner_notified: false,
            owner_contacted_finder: false,
            resolved_at: None,
        };

        let report = self.store.create_report(draft)?;
        info!(code = %code, report_id = %report.id, "report submitted");

        // not atomic: concurrent finders may race on report_count
        record.last_reported_at = Some(reported_at);
        record.last_report_id = Some(report.id.clone());
        record.report_count = record.report_count.saturating_add(1);
        if let Err(err) = self.store.put_code(&record) {
            warn!(code = %code, report_id = %report.id, error = %err, "failed to update code after report");
        }

        Ok(report.id)
    }

    pub fn report_details(&self, report_id: &str) -> Result<Option<Report>, StoreError> {
        self.store.get_report(report_id)
    }
}
