//! Agent module for Caja
//!
//! This module contains the tool-calling execution loop shared by the main
//! assistant and the nested notes database agent.

pub mod core;

pub use core::Agent;
