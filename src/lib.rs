//! magnifier library crate.
//!
//! Camera capture, digital zoom and display for a desk magnifier. The binary
//! wires these together; the modules are public for integration testing.

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod event_loop;
pub mod logging;
pub mod magnify;
pub mod power;
pub mod service;
pub mod zoom;
