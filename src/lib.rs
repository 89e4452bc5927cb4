// ==============================================================================
// lib.rs - Mykrobe Summary Library
// ==============================================================================
// Description: Library interface for Mykrobe report summary modules
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod extractor;
pub mod schema;
pub mod rows;
pub mod output;
pub mod config;
pub mod processor;
