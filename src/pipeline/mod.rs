pub mod extraction;
pub mod geocoding;
pub mod processor; // Place resolution orchestrator
