//! I/O helpers for the render pipeline.

pub mod build;
pub mod config;
pub mod process;
pub mod sandbox;
