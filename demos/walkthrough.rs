//! Walks one finder through the flow against a local sled database.
//!
//! ```text
//! cargo run --example walkthrough -- https://tags.example.com/code/ifl-xyz99
//! ```
//!
//! Settings come from the `FOUND_REPORT_*` environment variables, see [`Config`].
use anyhow::{Context, Result};
use found_report::{
    Config, FlowDriver, SledStore, Stage, Workflow,
    code_format::extract_code,
    files::{DirFileStore, PhotoUpload},
    form::FormField,
    notify::LogNotifier,
    routes::parse_route,
    store::DocumentStore,
    types::{Batch, Code, CodeStatus, FoundDate},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,found_report=debug")),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(
        SledStore::open(&config.database_path)
            .with_context(|| format!("opening {}", config.database_path.display()))?,
    );
    seed(&store)?;

    let files = DirFileStore::new(&config.upload_dir, &config.public_url);
    let driver = FlowDriver::new(store, files, LogNotifier::new(), config.existence_strategy);

    let mut workflow = match &config.expected_prefix {
        Some(prefix) => Workflow::new().with_expected_prefix(prefix),
        None => Workflow::new(),
    };

    // the scanner hands over either a URL or the bare code
    let scanned = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/code/ifl-xyz99".to_string());
    let stage = match extract_code(&scanned) {
        Some(code) if !scanned.starts_with('/') => driver.enter(&mut workflow, &code),
        _ => driver.open_route(&mut workflow, &parse_route(&scanned)),
    };
    info!(stage = ?stage, "code entered");

    if workflow.stage() == &Stage::AlreadyReported {
        info!(existing = ?workflow.existing_report(), "reporting again anyway");
        workflow.report_anyway();
    }
    if workflow.stage() != &Stage::ReportForm {
        anyhow::bail!(
            "could not open the report form: {}",
            workflow.error().unwrap_or("no code entered")
        );
    }

    let form = workflow.form_mut().context("form is open")?;
    form.set(FormField::FinderName, "Alex Finder");
    form.set(FormField::FinderEmail, "alex@example.com");
    form.set(FormField::LocationFound, "Terminal 2, gate 5");
    form.set(FormField::Message, "Left at the information desk");
    form.set_position(51.47, -0.4543);

    let photo = PhotoUpload::new("suitcase.jpg", "image/jpeg", b"not really a jpeg".to_vec());
    let stage = driver.submit(&mut workflow, &[photo], FoundDate::today()).clone();
    match stage {
        Stage::Submitted(confirmation) => {
            info!(
                report_id = %confirmation.report_id,
                redirect = %confirmation.redirect,
                "report submitted"
            );
            Ok(())
        }
        stage => anyhow::bail!(
            "submission stopped at {stage:?}: {}",
            workflow.error().unwrap_or("form has errors")
        ),
    }
}

/// One batch with a couple of codes, written only if missing
fn seed(store: &SledStore) -> Result<()> {
    if store.get_batch("batch-airport")?.is_some() {
        return Ok(());
    }
    store.put_batch(
        &Batch::new("batch-airport", "Airport luggage tags", "IFL").set_product_type("luggage"),
    )?;
    store.put_code(
        &Code::new("IFL-XYZ99", CodeStatus::Assigned)
            .set_batch("batch-airport")
            .set_product_type("luggage")
            .assign_to("owner-demo"),
    )?;
    store.put_code(&Code::new("IFL-OFF01", CodeStatus::Disabled).set_batch("batch-airport"))?;
    info!("seeded demo codes");
    Ok(())
}
