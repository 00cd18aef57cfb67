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

//! Append-only manifest index for Cairn repositories.
//!
//! Layout: `model.rs` (identifiers, labels, metadata), `index.rs` (the
//! `ManifestIndex` trait and typed helpers), `pick.rs` (deterministic
//! latest-entry selection), `memory.rs`/`fs.rs` (backends), `repository.rs`
//! (connection handle and client identity).

pub mod error;
pub mod fs;
pub mod index;
pub mod memory;
pub mod model;
pub mod pick;
pub mod repository;

pub use error::{ManifestError, ManifestResult};
pub use fs::FsManifestIndex;
pub use index::{ManifestIndex, load_manifest, store_manifest};
pub use memory::MemoryManifestIndex;
pub use model::{EntryMetadata, Labels, ManifestEntry, ManifestId};
pub use pick::{compare_entries, pick_latest, pick_latest_id};
pub use repository::{ClientIdentity, Repository};
