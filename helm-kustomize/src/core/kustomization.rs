//! Edits to `kustomization.yaml` that keep every field we do not manage.

use crate::core::document::{Document, Value};
use crate::error::{RenderError, Result};

/// Conventional kustomize entry point.
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// File that receives all passthrough resources. Reserved inside the sandbox.
pub const ALL_RESOURCES_FILE: &str = "all.yaml";

/// A parsed kustomization with its `resources` list pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct Kustomization {
    /// `None` when the file has no `resources` field.
    pub resources: Option<Vec<String>>,
    raw: Document,
}

impl Kustomization {
    /// Parse kustomization content.
    ///
    /// `resources`, when present, must be a list of strings. A null value counts
    /// as absent, as it does for kustomize. A non-string entry
    /// is rejected rather than skipped, so the file is never rewritten with an
    /// entry silently missing.
    pub fn parse(content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content).map_err(|e| merge_error(e.to_string()))?;
        let raw = Document::parse(text)
            .map_err(merge_error)?
            .unwrap_or_default();

        let resources = match raw.get("resources") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(merge_error(format!(
                            "resources[{index}] must be a string, got {}",
                            other.kind_name()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                return Err(merge_error(format!(
                    "resources field must be an array, got {}",
                    other.kind_name()
                )));
            }
        };

        Ok(Self { resources, raw })
    }

    /// Append `resource` unless an identical entry exists. Returns whether the
    /// list changed.
    pub fn add_resource(&mut self, resource: &str) -> bool {
        let resources = self.resources.get_or_insert_with(Vec::new);
        if resources.iter().any(|r| r == resource) {
            return false;
        }
        resources.push(resource.to_string());
        let list = resources.iter().map(|r| Value::from(r.as_str())).collect();
        self.raw.insert("resources", Value::Sequence(list));
        true
    }

    /// Serialize the full document, unknown fields included.
    pub fn to_yaml(&self) -> Result<Vec<u8>> {
        Ok(self.raw.to_yaml()?.into_bytes())
    }
}

/// Make sure [`ALL_RESOURCES_FILE`] is listed in `resources`.
///
/// Returns the re-serialized file and whether it differs semantically from the
/// input. Callers only need to write the file back when `changed` is true.
pub fn ensure_all_resources(content: &[u8]) -> Result<(Vec<u8>, bool)> {
    let mut kustomization = Kustomization::parse(content)?;
    let changed = kustomization.add_resource(ALL_RESOURCES_FILE);
    Ok((kustomization.to_yaml()?, changed))
}

fn merge_error(message: String) -> RenderError {
    RenderError::Merge {
        file: KUSTOMIZATION_FILE,
        message,
    }
}
