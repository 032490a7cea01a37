//! Core types and definitions for the ORDNANCE combat simulation.
//!
//! This crate defines the vocabulary shared by the simulation and tools:
//! identifiers, components, events, enums, tuning constants, configuration
//! and the error type. It has no dependency on the ECS or any host engine.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod types;

pub use error::{OrdnanceError, Result};

#[cfg(test)]
mod tests;
