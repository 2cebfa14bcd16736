pub mod day_entries;
pub mod dives;
pub mod health;
pub mod response;
