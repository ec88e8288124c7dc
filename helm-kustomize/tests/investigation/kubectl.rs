//! End-to-end renders through `kubectl kustomize`.

use helm_kustomize::io::build::CommandBuilder;
use helm_kustomize::io::config::BuildConfig;
use helm_kustomize::render::render;

fn render_str(input: &str) -> Result<String, String> {
    let builder = CommandBuilder::new(BuildConfig::default());
    render(input.as_bytes(), &builder)
        .map(|out| String::from_utf8(out).expect("utf8 output"))
        .map_err(|e| e.to_string())
}

#[test]
#[ignore]
fn labels_are_merged_into_resources() {
    let input = r#"---
apiVersion: v1
kind: ConfigMap
metadata:
  name: test-configmap
data:
  key: value
---
apiVersion: helm.plugin.kustomize/v1
kind: KustomizePluginData
files:
  kustomization.yaml: |
    apiVersion: kustomize.config.k8s.io/v1beta1
    kind: Kustomization
    resources:
      - all.yaml
    labels:
    - includeSelectors: true
      includeTemplates: true
      pairs:
        app: test-app
"#;
    let expected = "apiVersion: v1
data:
  key: value
kind: ConfigMap
metadata:
  labels:
    app: test-app
  name: test-configmap
";
    assert_eq!(render_str(input).expect("render"), expected);
}

#[test]
#[ignore]
fn missing_all_yaml_reference_is_added() {
    let input = r#"---
apiVersion: v1
kind: Service
metadata:
  name: test-service
spec:
  ports:
    - port: 80
---
apiVersion: helm.plugin.kustomize/v1
kind: KustomizePluginData
files:
  kustomization.yaml: |
    apiVersion: kustomize.config.k8s.io/v1beta1
    kind: Kustomization
    namespace: test-namespace
"#;
    let expected = "apiVersion: v1
kind: Service
metadata:
  name: test-service
  namespace: test-namespace
spec:
  ports:
  - port: 80
";
    assert_eq!(render_str(input).expect("render"), expected);
}

#[test]
#[ignore]
fn json_patches_from_embedded_files_apply() {
    let input = r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: test-deployment
spec:
  replicas: 1
---
apiVersion: helm.plugin.kustomize/v1
kind: KustomizePluginData
files:
  kustomization.yaml: |
    apiVersion: kustomize.config.k8s.io/v1beta1
    kind: Kustomization
    resources:
      - all.yaml
    patches:
      - path: patches/replicas.yaml
        target:
          kind: Deployment
          name: test-deployment
  patches/replicas.yaml: |
    - op: replace
      path: /spec/replicas
      value: 3
"#;
    let expected = "apiVersion: apps/v1
kind: Deployment
metadata:
  name: test-deployment
spec:
  replicas: 3
";
    assert_eq!(render_str(input).expect("render"), expected);
}

#[test]
#[ignore]
fn missing_resource_file_reports_kustomize_output() {
    let input = r#"---
apiVersion: v1
kind: Service
metadata:
  name: test-service
---
apiVersion: helm.plugin.kustomize/v1
kind: KustomizePluginData
files:
  kustomization.yaml: |
    resources:
      - all.yaml
      - nonexistent-file.yaml
"#;
    let err = render_str(input).unwrap_err();
    assert!(err.contains("kubectl kustomize failed"), "{err}");
    assert!(err.contains("nonexistent-file.yaml"), "{err}");
}
