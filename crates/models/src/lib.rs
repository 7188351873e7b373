//! Report records and the reference data the submission form is built from.

pub mod errors;
pub mod reference;
pub mod report;
pub mod rules;

pub use report::{
    Commodity, DateInput, Payload, Report, ReportFields, ReportId, ReportInput, APPLICATION_DATE, INSPECTION_DATE,
};
