//! Domain types shared by every stage of the animation pipeline:
//! error taxonomy, environment configuration, job identity, the blob
//! key layout, and the raster image codec.

pub mod config;
pub mod error;
pub mod imaging;
pub mod job;
pub mod keys;
