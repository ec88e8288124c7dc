//! Investigation tests against a real kustomize.
//!
//! These run the full pipeline through `kubectl kustomize` and are excluded
//! from regular CI runs because they need `kubectl` on `PATH`.
//!
//! Run with: `cargo test --test investigation -- --ignored`

#[path = "investigation/kubectl.rs"]
mod kubectl;
