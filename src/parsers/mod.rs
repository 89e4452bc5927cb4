// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Loaders for Mykrobe report files
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod report;

pub use report::{DiscoveryError, ReportLoadError, ReportParser, SampleReport};
