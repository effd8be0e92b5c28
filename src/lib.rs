//! Volume Raiser
//!
//! Normalizes the per-application audio sessions of windowed processes to
//! the master volume of the default output device, or mutes them.

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod logging;
pub mod paths;
pub mod process;
pub mod raise;
pub mod report;
