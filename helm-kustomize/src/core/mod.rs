//! Deterministic document logic.
//!
//! Core modules are free of I/O. They operate on in-memory byte slices and
//! documents and return deterministic outputs suitable for tests.

pub mod document;
pub mod kustomization;
pub mod partition;
