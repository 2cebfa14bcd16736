//! Date-range statistics over day entries.

pub mod aggregate;
pub mod fields;
pub mod scanner;
pub mod series;

pub use fields::StatField;
pub use scanner::DateRangeScanner;
pub use series::Aggregate;
