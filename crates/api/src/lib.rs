//! HTTP surface and process entry point of the animation pipeline.
//!
//! Exposes submission (`POST /jobs`) and the assembly result
//! (`GET /jobs/{job_id}/animation`); the generation and assembly
//! workers run as background tasks next to the server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod workers;
