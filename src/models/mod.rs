//! Data models for jobharvest.

mod job;
mod unit;

pub use job::{normalize_salary_bounds, JobRecord, Salary};
pub use unit::{RawUnit, SourceKind};
