//! Rewrites the potassium prediction pipeline sources into the magnesium
//! pipeline. The rules live in [`manifest`]; [`driver`] runs them file by file
//! against a [`store::FileStore`].

pub mod driver;
pub mod manifest;
pub mod migrate;
pub mod store;
pub mod ui;

pub use driver::{Driver, Report, TaskError, TaskReport, TaskStatus};
pub use manifest::{FileTask, Manifest};
pub use store::{DiskStore, FileStore, InMemoryStore, StoreError};
