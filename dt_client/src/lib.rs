//! Internal modules for the dev_trumps terminal client.
//!
//! This library provides command parsing, configuration, logging setup and
//! event rendering used by the dt_client binary.

pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
