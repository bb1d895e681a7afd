//! ADCP-RS: binary ensemble codec for ADCP/DVL instrument output
//!
//! An ensemble is one instrument sample: a 32-byte framed header, a payload
//! of self-describing datasets and a CRC-16 trailer. This crate encodes and
//! decodes ensembles, models each dataset type, converts to and from JSON
//! and other instrument formats, and scans byte streams for ensembles.

pub mod adapters;
pub mod codec;
pub mod common;
pub mod config;
pub mod dataset;
pub mod ensemble;
pub mod ensemble_emulator;
