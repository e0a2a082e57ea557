//! Found item reporting for lost-and-found tags.
//!
//! A finder enters the code printed on a tag. The code is format checked, looked up
//! in the document store and checked for an earlier report; the finder then fills in
//! a report which is persisted and forwarded to the owner. [`workflow::Workflow`]
//! holds the stage machine, [`workflow::FlowDriver`] wires it to the services.

pub mod code_format;
pub mod config;
pub mod error;
pub mod files;
pub mod form;
pub mod lookup;
pub mod notify;
pub mod report;
pub mod routes;
pub mod store;
pub mod types;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use store::{DocumentStore, MemoryStore, SledStore};
pub use workflow::{FlowDriver, Stage, Workflow};
