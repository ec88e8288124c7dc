//! Test-only helpers: a scripted builder and manifest fixtures.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::document::{Document, Value};
use crate::core::partition::{API_VERSION, KIND};
use crate::error::{RenderError, Result};
use crate::io::build::Builder;

/// Snapshot of one build invocation.
#[derive(Debug, Clone)]
pub struct BuildCall {
    pub dir: PathBuf,
    /// Every file in the sandbox at build time, keyed by `/`-separated relative path.
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
enum Script {
    Echo(String),
    Fail(String),
}

/// Builder that records the sandbox contents instead of running kustomize.
#[derive(Debug)]
pub struct RecordingBuilder {
    script: Script,
    calls: RefCell<Vec<BuildCall>>,
}

impl RecordingBuilder {
    /// Return the content of `file` from the sandbox as build output.
    pub fn echo(file: &str) -> Self {
        Self {
            script: Script::Echo(file.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Fail every build with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Script::Fail(message.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<BuildCall> {
        self.calls.borrow().clone()
    }
}

impl Builder for RecordingBuilder {
    fn build(&self, dir: &Path) -> Result<Vec<u8>> {
        let mut files = BTreeMap::new();
        snapshot(dir, dir, &mut files).expect("snapshot sandbox");
        let call = BuildCall {
            dir: dir.to_path_buf(),
            files,
        };
        let result = match &self.script {
            Script::Echo(file) => Ok(call
                .files
                .get(file)
                .map(|content| content.clone().into_bytes())
                .unwrap_or_default()),
            Script::Fail(message) => Err(RenderError::Build(message.clone())),
        };
        self.calls.borrow_mut().push(call);
        result
    }
}

fn snapshot(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            snapshot(root, &path, files)?;
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .expect("entry under root")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(rel, fs::read_to_string(&path)?);
    }
    Ok(())
}

/// Render a `KustomizePluginData` document carrying `files`.
pub fn plugin_data_doc(files: &[(&str, &str)]) -> String {
    let mut doc = Document::new();
    doc.insert("apiVersion", Value::from(API_VERSION));
    doc.insert("kind", Value::from(KIND));
    doc.insert(
        "files",
        Value::Mapping(
            files
                .iter()
                .map(|(path, content)| (path.to_string(), Value::from(*content)))
                .collect(),
        ),
    );
    doc.to_yaml().expect("encode plugin data")
}
