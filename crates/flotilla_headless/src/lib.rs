//! Headless runner for the Flotilla simulation core.
//!
//! Loads a RON scenario, builds a [`flotilla_core::world::World`], runs
//! it for a fixed number of ticks and reports a JSON summary. This is the
//! only crate in the workspace that performs IO.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
pub mod scenario;
