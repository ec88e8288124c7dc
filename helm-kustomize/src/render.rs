//! Post-render pipeline: partition, materialize, merge, build.

use tracing::{debug, info, instrument};

use crate::core::document::encode_stream;
use crate::core::kustomization::{ALL_RESOURCES_FILE, KUSTOMIZATION_FILE, ensure_all_resources};
use crate::core::partition::{KIND, parse_manifests};
use crate::error::{RenderError, Result, SandboxError};
use crate::io::build::Builder;
use crate::io::sandbox::Sandbox;

/// Run the post-render pipeline over a complete manifest stream.
///
/// Without a `KustomizePluginData` document the input is validated and returned
/// byte for byte, so quoting and `# Source:` comments survive for Helm's YAML 1.1
/// reader. Otherwise its files are materialized in a fresh
/// sandbox together with `all.yaml`, and the output of `builder` is returned.
/// The sandbox is removed before this returns, whatever the outcome.
#[instrument(skip_all, fields(input_bytes = input.len()))]
pub fn render<B: Builder>(input: &[u8], builder: &B) -> Result<Vec<u8>> {
    let parsed = parse_manifests(input)?;
    debug!(
        resources = parsed.resources.len(),
        has_plugin_data = parsed.plugin_data.is_some(),
        "parsed manifests"
    );

    let Some(plugin_data) = parsed.plugin_data else {
        return Ok(input.to_vec());
    };

    if plugin_data.files.contains_key(ALL_RESOURCES_FILE) {
        return Err(RenderError::Constraint(format!(
            "{KIND}.files cannot contain '{ALL_RESOURCES_FILE}' - this file is reserved for Helm manifests"
        )));
    }

    let sandbox = Sandbox::create()?;
    sandbox.extract_all(&plugin_data.files)?;

    let all_resources = encode_stream(&parsed.resources)?;
    sandbox.write_file(ALL_RESOURCES_FILE, &all_resources)?;

    match sandbox.read_file(KUSTOMIZATION_FILE) {
        Ok(content) => {
            let (updated, changed) = ensure_all_resources(&content)?;
            if changed {
                debug!("adding {ALL_RESOURCES_FILE} to {KUSTOMIZATION_FILE}");
                sandbox.write_file(KUSTOMIZATION_FILE, &updated)?;
            }
        }
        // kustomize reports a missing kustomization itself.
        Err(SandboxError::NotFound(_)) => debug!("no {KUSTOMIZATION_FILE} provided"),
        Err(err) => return Err(err.into()),
    }

    let dir = sandbox.path().ok_or(SandboxError::Destroyed)?;
    let output = builder.build(dir)?;
    info!(output_bytes = output.len(), "render complete");
    Ok(output)
}
