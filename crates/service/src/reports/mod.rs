//! Report store and the dashboard/form operations built on it.

pub mod actions;
pub mod dates;
pub mod export;
pub mod filter;
pub mod repository;
pub mod store;

pub use actions::{ActionOutcome, FailureKind, ReportActions};
pub use filter::ReportFilter;
pub use repository::ReportRepository;
pub use store::ReportStore;
