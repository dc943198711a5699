//! Core domain models
//!
//! This module defines the data structures that represent the two
//! deployment descriptors: the pipeline with its steps and run state,
//! and the configuration both descriptors are loaded from.

pub mod config;
pub mod pipeline;
pub mod state;
pub mod step;

pub use pipeline::*;
pub use state::*;
pub use step::*;
