pub mod analyses;
pub mod comparisons;
pub mod extractions;
pub mod health;
pub mod uploads;
