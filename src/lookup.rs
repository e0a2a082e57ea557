//! Code lookup against the document store
use crate::code_format::normalize;
use crate::store::DocumentStore;
use crate::types::{Batch, Code};
use tracing::{debug, error, warn};

pub const NOT_FOUND_MESSAGE: &str = "Code not found. Please check the code and try again.";
pub const DISABLED_MESSAGE: &str = "This code has been disabled.";
pub const VALID_MESSAGE: &str = "Code validated successfully.";

#[derive(Debug, Clone, PartialEq)]
pub struct CodeValidationResult {
    pub valid: bool,
    pub code: String,
    pub message: String,
    pub code_data: Option<Code>,
    pub batch_data: Option<Batch>,
}

impl CodeValidationResult {
    fn invalid(code: String, message: impl Into<String>, code_data: Option<Code>) -> Self {
        Self {
            valid: false,
            code,
            message: message.into(),
            code_data,
            batch_data: None,
        }
    }
}

pub struct CodeLookupService<S> {
    store: S,
}

impl<S: DocumentStore> CodeLookupService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve a code to its record and batch. Never fails: store errors come back
    /// as an invalid result carrying the error text.
    pub fn lookup_code(&self, code: &str) -> CodeValidationResult {
        let code = normalize(code);

        let record = match self.store.get_code(&code) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(code = %code, "code not found");
                return CodeValidationResult::invalid(code, NOT_FOUND_MESSAGE, None);
            }
            Err(err) => {
                error!(code = %code, error = %err, "error validating code");
                return CodeValidationResult::invalid(
                    code,
                    format!("Error validating code: {err}"),
                    None,
                );
            }
        };

        if record.is_disabled() {
            debug!(code = %code, "code is disabled");
            return CodeValidationResult::invalid(code, DISABLED_MESSAGE, Some(record));
        }

        // batch metadata is decoration; a missing or unreadable batch doesn't block the finder
        let batch_data = match record.batch_id.as_deref() {
            Some(batch_id) => match self.store.get_batch(batch_id) {
                Ok(batch) => batch,
                Err(err) => {
                    warn!(code = %code, batch_id, error = %err, "failed to load batch");
                    None
                }
            },
            None => None,
        };

        CodeValidationResult {
            valid: true,
            code,
            message: VALID_MESSAGE.to_string(),
            code_data: Some(record),
            batch_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::CodeStatus;

    #[test]
    fn missing_code_is_not_found() {
        let service = CodeLookupService::new(MemoryStore::new());
        let result = service.lookup_code("ifl-zzz00");

        assert!(!result.valid);
        assert_eq!(result.code, "IFL-ZZZ00");
        assert!(result.message.contains("not found"));
    }

    #[test]
    fn disabled_code_is_rejected_with_data() {
        let store = MemoryStore::new();
        store
            .put_code(&Code::new("IFL-OFF1", CodeStatus::Disabled).assign_to("owner"))
            .unwrap();
        let result = CodeLookupService::new(store).lookup_code("IFL-OFF1");

        assert!(!result.valid);
        assert_eq!(result.message, DISABLED_MESSAGE);
        assert!(result.code_data.is_some());
    }

    #[test]
    fn missing_batch_is_tolerated() {
        let store = MemoryStore::new();
        store
            .put_code(&Code::new("IFL-OK1", CodeStatus::Available).set_batch("gone"))
            .unwrap();
        let result = CodeLookupService::new(store).lookup_code(" ifl-ok1 ");

        assert!(result.valid);
        assert_eq!(result.code, "IFL-OK1");
        assert!(result.batch_data.is_none());
    }

    #[test]
    fn batch_is_attached_when_present() {
        let store = MemoryStore::new();
        store
            .put_code(&Code::new("IFL-OK2", CodeStatus::Assigned).set_batch("b1"))
            .unwrap();
        store
            .put_batch(&Batch::new("b1", "Luggage tags", "IFL").set_product_type("luggage"))
            .unwrap();
        let result = CodeLookupService::new(store).lookup_code("IFL-OK2");

        assert!(result.valid);
        assert_eq!(result.batch_data.unwrap().name, "Luggage tags");
    }
}
