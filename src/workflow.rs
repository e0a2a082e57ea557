//! The code entry -> report workflow
//!
//! [`Workflow`] is a plain state machine: every network round trip is split into a
//! `begin_*` call that hands out a [`Ticket`] and an `apply_*` call that feeds the
//! result back. Any stage change moves the generation on, so a result that arrives
//! for a ticket from an earlier generation is dropped with [`Applied::Stale`].
//!
//! [`FlowDriver`] runs the machine against the lookup, report, file and
//! notification services.
use crate::code_format::{self, normalize};
use crate::error::SubmissionError;
use crate::files::{FileStore, PhotoUpload, photo_path};
use crate::form::ReportForm;
use crate::lookup::{CodeLookupService, CodeValidationResult};
use crate::notify::{NotificationService, Notifier};
use crate::report::{ExistenceStrategy, ExistingReport, ReportInput, ReportService};
use crate::routes::{self, Route};
use crate::store::DocumentStore;
use crate::types::FoundDate;
use chrono::Utc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub report_id: String,
    pub code: String,
    /// Where the finder goes next, `/success?reportId=..&code=..`
    pub redirect: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    CodeEntry,
    Validating,
    ReportForm,
    AlreadyReported,
    Submitted(Confirmation),
}

/// Identifies one in-flight request. Only the newest ticket can change the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    code: String,
}

impl Ticket {
    pub fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result belonged to an older request and was dropped
    Stale,
    /// Lookup succeeded; run the existence check with the same ticket
    CheckExisting,
    /// The workflow settled in a new stage
    Settled,
}

#[derive(Debug)]
pub struct Workflow {
    stage: Stage,
    code: String,
    error: Option<String>,
    expected_prefix: Option<String>,
    validation: Option<CodeValidationResult>,
    existing: Option<ExistingReport>,
    form: Option<ReportForm>,
    is_loading: bool,
    is_submitting: bool,
    generation: u64,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            stage: Stage::CodeEntry,
            code: String::new(),
            error: None,
            expected_prefix: None,
            validation: None,
            existing: None,
            form: None,
            is_loading: false,
            is_submitting: false,
            generation: 0,
        }
    }

    /// Require every code to start with `prefix` before it is looked up
    pub fn with_expected_prefix(mut self, prefix: &str) -> Self {
        self.expected_prefix = Some(normalize(prefix));
        self
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
    pub fn validation(&self) -> Option<&CodeValidationResult> {
        self.validation.as_ref()
    }
    pub fn existing_report(&self) -> Option<&ExistingReport> {
        self.existing.as_ref()
    }
    pub fn form(&self) -> Option<&ReportForm> {
        self.form.as_ref()
    }
    pub fn form_mut(&mut self) -> Option<&mut ReportForm> {
        self.form.as_mut()
    }
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    // a stage change orphans whatever was in flight, so its busy flag goes with it
    fn advance(&mut self, stage: Stage) -> u64 {
        self.generation += 1;
        self.is_loading = false;
        self.is_submitting = false;
        debug!(from = ?self.stage, to = ?stage, generation = self.generation, "stage change");
        self.stage = stage;
        self.generation
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && ticket.code == self.code
    }

    /// Finder submitted a code. Returns a ticket for the lookup, or `None` when the
    /// code failed the format check (back in `CodeEntry` with a message) or a
    /// lookup or submission is already running.
    pub fn begin_validation(&mut self, raw: &str) -> Option<Ticket> {
        if self.is_loading || self.is_submitting || matches!(self.stage, Stage::Submitted(_)) {
            return None;
        }

        self.code = normalize(raw);
        self.error = None;
        self.validation = None;
        self.existing = None;
        self.form = None;
        self.advance(Stage::Validating);

        let checked = match &self.expected_prefix {
            Some(prefix) => code_format::check_with_prefix(raw, prefix),
            None => code_format::check(raw),
        };
        if let Err(err) = checked {
            debug!(code = %self.code, error = %err, "code rejected by format check");
            self.error = Some(err.to_string());
            self.advance(Stage::CodeEntry);
            return None;
        }

        self.is_loading = true;
        Some(Ticket {
            generation: self.generation,
            code: self.code.clone(),
        })
    }

    pub fn apply_lookup(&mut self, ticket: &Ticket, result: CodeValidationResult) -> Applied {
        if !self.is_current(ticket) || self.stage != Stage::Validating {
            debug!(code = %ticket.code, "dropping stale lookup result");
            return Applied::Stale;
        }

        if !result.valid {
            self.error = Some(result.message.clone());
            self.validation = Some(result);
            self.advance(Stage::CodeEntry);
            return Applied::Settled;
        }

        self.validation = Some(result);
        Applied::CheckExisting
    }

    pub fn apply_existing(&mut self, ticket: &Ticket, existing: ExistingReport) -> Applied {
        if !self.is_current(ticket) || self.stage != Stage::Validating {
            debug!(code = %ticket.code, "dropping stale existence check");
            return Applied::Stale;
        }

        let already = existing.exists;
        self.existing = Some(existing);
        if already {
            self.advance(Stage::AlreadyReported);
        } else {
            self.open_form();
        }
        Applied::Settled
    }

    fn open_form(&mut self) {
        if self.form.as_ref().map(|f| f.code()) != Some(self.code.as_str()) {
            self.form = Some(ReportForm::new(&self.code, FoundDate::today()));
        }
        self.advance(Stage::ReportForm);
    }

    /// Explicit override from `AlreadyReported`: file another report for the same code
    pub fn report_anyway(&mut self) -> bool {
        if self.stage != Stage::AlreadyReported {
            return false;
        }
        self.error = None;
        self.open_form();
        true
    }

    /// Abandon whatever is in progress and go back to code entry. In-flight results
    /// for the old generation will be dropped.
    pub fn return_to_entry(&mut self) {
        self.error = None;
        self.advance(Stage::CodeEntry);
    }

    /// Validate the form locally and hand out a ticket plus the input to submit.
    /// `None` when not on the form, already submitting, or the form has errors.
    pub fn begin_submit(&mut self, today: FoundDate) -> Option<(Ticket, ReportInput)> {
        if self.stage != Stage::ReportForm || self.is_submitting {
            return None;
        }
        let input = self.form.as_mut()?.to_input(today)?;

        self.error = None;
        self.is_submitting = true;
        self.generation += 1;
        Some((
            Ticket {
                generation: self.generation,
                code: self.code.clone(),
            },
            input,
        ))
    }

    pub fn apply_submission(
        &mut self,
        ticket: &Ticket,
        outcome: Result<String, SubmissionError>,
    ) -> Applied {
        if !self.is_current(ticket) || self.stage != Stage::ReportForm {
            if let Ok(report_id) = &outcome {
                warn!(code = %ticket.code, report_id = %report_id, "submission finished after the finder left the form");
            }
            return Applied::Stale;
        }

        self.is_submitting = false;
        match outcome {
            Ok(report_id) => {
                let redirect = routes::success_redirect(&report_id, &self.code);
                let confirmation = Confirmation {
                    report_id,
                    code: self.code.clone(),
                    redirect,
                };
                self.advance(Stage::Submitted(confirmation));
            }
            Err(err) => {
                // stay on the form, values untouched
                self.error = Some(format!("Failed to submit report. {err}"));
            }
        }
        Applied::Settled
    }
}

/// Runs a [`Workflow`] against the services, one request at a time
pub struct FlowDriver<S, F, N> {
    lookup: CodeLookupService<S>,
    reports: ReportService<S>,
    notifications: NotificationService<S, N>,
    files: F,
}

impl<S, F, N> FlowDriver<S, F, N>
where
    S: DocumentStore + Clone,
    F: FileStore,
    N: Notifier,
{
    pub fn new(store: S, files: F, notifier: N, strategy: ExistenceStrategy) -> Self {
        Self {
            lookup: CodeLookupService::new(store.clone()),
            reports: ReportService::with_strategy(store.clone(), strategy),
            notifications: NotificationService::new(store, notifier),
            files,
        }
    }

    pub fn reports(&self) -> &ReportService<S> {
        &self.reports
    }

    /// Validate a typed or scanned code and settle on the next stage
    pub fn enter<'w>(&self, workflow: &'w mut Workflow, raw: &str) -> &'w Stage {
        let Some(ticket) = workflow.begin_validation(raw) else {
            return workflow.stage();
        };

        let result = self.lookup.lookup_code(ticket.code());
        if workflow.apply_lookup(&ticket, result) == Applied::CheckExisting {
            let existing = self.reports.check_existing_report(ticket.code());
            workflow.apply_existing(&ticket, existing);
        }
        workflow.stage()
    }

    /// Start from an entry URL. A code in the path or query is validated right away.
    pub fn open_route<'w>(&self, workflow: &'w mut Workflow, route: &Route) -> &'w Stage {
        match route {
            Route::Code(Some(code)) => self.enter(workflow, code),
            _ => workflow.stage(),
        }
    }

    /// Upload photos, create the report and notify the owner.
    ///
    /// Every photo must be stored before the report is written, since the record
    /// carries their URLs. The notification is fire and forget.
    pub fn submit<'w>(
        &self,
        workflow: &'w mut Workflow,
        photos: &[PhotoUpload],
        today: FoundDate,
    ) -> &'w Stage {
        let Some((ticket, mut input)) = workflow.begin_submit(today) else {
            return workflow.stage();
        };

        let outcome = match self.upload_photos(ticket.code(), photos) {
            Ok(urls) => {
                input.photos.extend(urls);
                self.reports.submit_report(input)
            }
            Err(err) => Err(err),
        };

        if let Ok(report_id) = &outcome {
            self.notify_owner(report_id, ticket.code());
        }
        workflow.apply_submission(&ticket, outcome);
        workflow.stage()
    }

    fn upload_photos(&self, code: &str, photos: &[PhotoUpload]) -> Result<Vec<String>, SubmissionError> {
        let mut urls = Vec::with_capacity(photos.len());
        for (index, photo) in photos.iter().enumerate() {
            let path = photo_path(code, Utc::now().timestamp_millis(), index, &photo.file_name);
            let url = self.files.upload(&path, &photo.bytes, &photo.content_type)?;
            urls.push(url);
        }
        Ok(urls)
    }

    fn notify_owner(&self, report_id: &str, code: &str) {
        match self.notifications.send_item_found(report_id, code) {
            Ok(true) => info!(report_id, code, "owner notification sent"),
            Ok(false) => warn!(report_id, code, "owner notification not delivered"),
            Err(err) => warn!(report_id, code, error = %err, "owner notification failed"),
        }
    }
}
