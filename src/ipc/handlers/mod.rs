pub mod core;
pub mod fields;
pub mod reports;
pub mod sessions;
pub mod topics;
