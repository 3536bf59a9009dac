//! # Sunrise Alarm Library
//!
//! Internal library for the `sunrise-alarm` binary.
//!
//! This library exists to enable testing of the alarm internals and to keep CLI dispatch
//! (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: [`SunriseAlarm`] assembles config, sinks and signals, then runs
//! - **Core Logic**: `core` holds the alarm state machine, the brightness, volume and
//!   inactivity controllers, and the runtime loop that ticks them
//! - **Backends**: `backend` defines the brightness, audio and host traits with sysfs
//!   backlight and terminal implementations
//! - **Configuration**: `config` for TOML settings with validation and a default file
//! - **State**: `state` persists the armed alarm across launches
//! - **Commands**: `commands` for the `status` and `clear` one-shots
//! - **Infrastructure**: signal handling, the clock source with simulation, and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod state;
pub mod time;

mod app;

pub use app::SunriseAlarm;
