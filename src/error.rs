#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Code cannot be empty")]
    Empty,
    #[error("Invalid code format. Expected something like \"IFL-ABC123\"")]
    Malformed,
    #[error("Code must start with the prefix \"{0}\"")]
    WrongPrefix(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(String),
    #[error("failed to generate an identifier: {0}")]
    IdGeneration(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Hard failures of a report submission. These keep the finder on the form.
#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    #[error("Invalid code. Please check the code and try again.")]
    InvalidCode,
    #[error("This code has been disabled.")]
    DisabledCode,
    #[error("Report is missing required field: {0}")]
    Incomplete(&'static str),
    #[error("Photo upload failed: {0}")]
    PhotoUpload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("empty upload for {0}")]
    Empty(String),
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file store unavailable: {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("report {0} not found")]
    ReportNotFound(String),
    #[error("code {0} not found")]
    CodeNotFound(String),
    #[error("no owner is assigned to code {0}")]
    NoOwner(String),
    #[error("notification call failed: {0}")]
    Call(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unrecognized {kind} status \"{value}\"")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}='{value}'. expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
