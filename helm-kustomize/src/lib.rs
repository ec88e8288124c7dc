//! Helm post-renderer that applies kustomize overlays shipped inside the chart.
//!
//! A chart renders one `KustomizePluginData` document whose `files` map holds a
//! kustomization. This crate pulls that document out of the rendered stream,
//! writes its files plus the remaining manifests (`all.yaml`) into a throwaway
//! sandbox, and returns the output of `kubectl kustomize` on that directory.
//!
//! - **[`core`]**: Pure document handling (decode, partition, kustomization merge).
//! - **[`io`]**: Side effects (sandboxed filesystem, process execution, config).
//!
//! [`render`] ties both together.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
