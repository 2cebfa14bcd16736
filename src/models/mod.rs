pub mod day_entry;
pub mod dive;
