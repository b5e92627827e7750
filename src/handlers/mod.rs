// Handlers for the fixed status endpoints

pub mod ami;
pub mod summary;

pub use ami::{AmiStatus, AMI_METADATA_ENDPOINT};
pub use summary::StatusSummary;
