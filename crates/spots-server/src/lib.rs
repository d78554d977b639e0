//! Drone spot search service: library surface for the binary and tests.

pub mod accessibility;
pub mod api;
pub mod cache;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod nofly;
pub mod providers;
pub mod resolver;
pub mod search;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;
