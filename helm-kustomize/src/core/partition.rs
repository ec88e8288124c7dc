//! Split a manifest stream into the plugin control document and passthrough
//! documents.

use std::collections::BTreeMap;

use crate::core::document::{Document, Value, decode_stream};
use crate::error::{RenderError, Result};

pub const API_VERSION: &str = "helm.plugin.kustomize/v1";
pub const KIND: &str = "KustomizePluginData";

/// The control document carrying the embedded kustomize file set.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginData {
    /// Opaque; kept for completeness, never interpreted.
    pub metadata: Option<Value>,
    /// Relative path -> file content.
    pub files: BTreeMap<String, String>,
}

/// Result of partitioning one input stream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParseResult {
    pub plugin_data: Option<PluginData>,
    /// Every other document, in input order.
    pub resources: Vec<Document>,
}

/// Whether `doc` is identified as the control document.
pub fn is_plugin_data(doc: &Document) -> bool {
    doc.str_field("apiVersion") == Some(API_VERSION) && doc.str_field("kind") == Some(KIND)
}

/// Decode `input` and separate the control document from everything else.
///
/// At most one control document is accepted. Its `files` field is validated
/// strictly; other documents pass through untouched.
pub fn parse_manifests(input: &[u8]) -> Result<ParseResult> {
    let mut result = ParseResult::default();

    for doc in decode_stream(input)? {
        if !is_plugin_data(&doc) {
            result.resources.push(doc);
            continue;
        }
        let data = extract_plugin_data(&doc)?;
        if result.plugin_data.is_some() {
            return Err(RenderError::Constraint(format!(
                "multiple {KIND} resources found, only one is supported"
            )));
        }
        result.plugin_data = Some(data);
    }

    Ok(result)
}

fn extract_plugin_data(doc: &Document) -> Result<PluginData> {
    let files = match doc.get("files") {
        Some(Value::Mapping(files)) => files,
        Some(other) => {
            return Err(schema_error(format!(
                "'files' field must be a map, got {}",
                other.kind_name()
            )));
        }
        None => return Err(schema_error("'files' field is required".to_string())),
    };

    let files = files
        .iter()
        .map(|(path, content)| match content {
            Value::String(content) => Ok((path.clone(), content.clone())),
            other => Err(schema_error(format!(
                "'files' values must be strings, got {} for key {path:?}",
                other.kind_name()
            ))),
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(PluginData {
        metadata: doc.get("metadata").cloned(),
        files,
    })
}

fn schema_error(message: String) -> RenderError {
    RenderError::Schema {
        kind: KIND,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::encode_stream;

    const PLUGIN_DATA: &str = "apiVersion: helm.plugin.kustomize/v1
kind: KustomizePluginData
metadata:
  name: kustomize-files
files:
  kustomization.yaml: |
    resources:
      - all.yaml
  patches/replicas.yaml: 'spec: {replicas: 3}'
";

    #[test]
    fn identifies_plugin_data_by_api_version_and_kind() {
        let cases = [
            ("apiVersion: helm.plugin.kustomize/v1\nkind: KustomizePluginData\n", true),
            ("apiVersion: v1\nkind: KustomizePluginData\n", false),
            ("apiVersion: helm.plugin.kustomize/v1\nkind: ConfigMap\n", false),
            ("kind: KustomizePluginData\n", false),
            ("apiVersion: helm.plugin.kustomize/v1\n", false),
            ("apiVersion: helm.plugin.kustomize/v1\nkind: [KustomizePluginData]\n", false),
        ];
        for (input, expected) in cases {
            let doc = Document::parse(input).expect("parse").expect("doc");
            assert_eq!(is_plugin_data(&doc), expected, "{input}");
        }
    }

    #[test]
    fn empty_input_has_nothing() {
        let result = parse_manifests(b"").expect("parse");
        assert_eq!(result, ParseResult::default());
    }

    #[test]
    fn separates_plugin_data_and_keeps_resource_order() {
        let input = format!(
            "---\napiVersion: v1\nkind: Service\nmetadata:\n  name: test-service\n---\n{PLUGIN_DATA}---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: test-deployment\n"
        );
        let result = parse_manifests(input.as_bytes()).expect("parse");

        let data = result.plugin_data.expect("plugin data");
        assert_eq!(data.files.len(), 2);
        assert_eq!(data.files["kustomization.yaml"], "resources:\n  - all.yaml\n");
        assert_eq!(data.files["patches/replicas.yaml"], "spec: {replicas: 3}");
        assert!(matches!(data.metadata, Some(Value::Mapping(_))));

        let kinds: Vec<_> = result
            .resources
            .iter()
            .map(|doc| doc.str_field("kind").expect("kind"))
            .collect();
        assert_eq!(kinds, vec!["Service", "Deployment"]);
    }

    #[test]
    fn multiple_plugin_data_is_a_constraint_error() {
        let input = format!("{PLUGIN_DATA}---\n{PLUGIN_DATA}");
        let err = parse_manifests(input.as_bytes()).unwrap_err();
        assert!(matches!(err, RenderError::Constraint(_)));
        assert!(err.to_string().contains("multiple KustomizePluginData"), "{err}");
    }

    #[test]
    fn non_string_file_content_names_the_key() {
        let input = "apiVersion: helm.plugin.kustomize/v1\nkind: KustomizePluginData\nfiles:\n  good.yaml: ok\n  bad.yaml:\n    nested: map\n";
        let err = parse_manifests(input.as_bytes()).unwrap_err();
        assert!(matches!(err, RenderError::Schema { .. }));
        assert!(err.to_string().contains("\"bad.yaml\""), "{err}");
    }

    #[test]
    fn files_must_be_a_map() {
        let input = "apiVersion: helm.plugin.kustomize/v1\nkind: KustomizePluginData\nfiles: [a, b]\n";
        let err = parse_manifests(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'files' field must be a map"), "{err}");

        let missing = "apiVersion: helm.plugin.kustomize/v1\nkind: KustomizePluginData\n";
        let err = parse_manifests(missing.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'files' field is required"), "{err}");
    }

    #[test]
    fn invalid_yaml_is_a_decode_error() {
        let err = parse_manifests(b"---\ninvalid: yaml: structure:\n  bad indentation\n").unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn reencoded_resources_partition_back_identically() {
        let input = b"kind: A\nn: 1\n---\nkind: B\nlist: [x, y]\n---\nkind: C\nnested:\n  deep: {k: v}\n";
        let first = parse_manifests(input).expect("parse");
        let encoded = encode_stream(&first.resources).expect("encode");
        let second = parse_manifests(&encoded).expect("parse again");
        assert_eq!(second.resources, first.resources);
        assert_eq!(second.resources.len(), 3);
    }
}
