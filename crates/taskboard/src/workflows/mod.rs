pub mod dashboard;
pub mod refresh;
pub mod sheets;
