#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Repository-wide maintenance parameters stored in the manifest index.
//!
//! Layout: `model.rs` (parameter record and defaults), `defaults.rs` (label
//! and schedule constants), `validate.rs` (pre-write checks), `service.rs`
//! (`MaintenanceService` + `MaintenanceFacade`, the commit/retire protocol).

pub mod defaults;
pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{MaintenanceError, MaintenanceResult};
pub use model::{CycleParams, LogRetentionOptions, MaintenanceParams};
pub use service::{CommittedParams, MaintenanceFacade, MaintenanceService, maintenance_labels};
pub use validate::validate_params;
