//! JSON Schema registry
//!
//! Schemas live in an abstract read-only file tree and are addressed by name
//! (`ocpp16/Authorize.json`). Each schema is compiled on first use and cached
//! for the lifetime of the registry; after warm-up the registry is read-only.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

/// Read-only tree of named schema resources.
pub trait SchemaSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Vec<u8>, SchemaError>;
}

/// Schema source backed by a directory on disk.
pub struct DirSchemaSource {
    root: PathBuf,
}

impl DirSchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SchemaSource for DirSchemaSource {
    fn load(&self, name: &str) -> Result<Vec<u8>, SchemaError> {
        if name.split('/').any(|seg| seg == "..") {
            return Err(SchemaError::NotFound(name.to_string()));
        }
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SchemaError::NotFound(name.to_string()))
            }
            Err(e) => Err(SchemaError::Io {
                name: name.to_string(),
                source: e,
            }),
        }
    }
}

/// Errors loading or compiling a schema. These indicate a broken deployment,
/// not a misbehaving charge station.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema {0} not found")]
    NotFound(String),
    #[error("reading schema {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
    #[error("schema {name} is not valid JSON: {message}")]
    Parse { name: String, message: String },
    #[error("schema {name} does not compile: {message}")]
    Compile { name: String, message: String },
}

/// A payload that failed validation against its schema.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{location}: {message}")]
pub struct FormatViolation {
    /// JSON pointer into the offending instance.
    pub location: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("format violation: {0}")]
    Violation(#[from] FormatViolation),
}

/// Compile-on-first-use schema cache.
pub struct SchemaRegistry {
    source: Box<dyn SchemaSource>,
    compiled: DashMap<String, Arc<JSONSchema>>,
}

impl SchemaRegistry {
    pub fn new(source: impl SchemaSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            compiled: DashMap::new(),
        }
    }

    fn compiled(&self, name: &str) -> Result<Arc<JSONSchema>, SchemaError> {
        if let Some(schema) = self.compiled.get(name) {
            return Ok(schema.clone());
        }

        let bytes = self.source.load(name)?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| SchemaError::Parse {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        let schema = JSONSchema::compile(&value).map_err(|e| SchemaError::Compile {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let schema = Arc::new(schema);
        self.compiled.insert(name.to_string(), schema.clone());
        Ok(schema)
    }

    /// Validate `instance` against the named schema.
    pub fn validate(&self, name: &str, instance: &Value) -> Result<(), ValidateError> {
        let schema = self.compiled(name)?;
        if let Err(mut errors) = schema.validate(instance) {
            // The first violation is enough to reject the payload.
            if let Some(err) = errors.next() {
                return Err(FormatViolation {
                    location: err.instance_path.to_string(),
                    message: err.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MapSource(std::collections::HashMap<String, Vec<u8>>);

    impl SchemaSource for MapSource {
        fn load(&self, name: &str) -> Result<Vec<u8>, SchemaError> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| SchemaError::NotFound(name.to_string()))
        }
    }

    fn registry_with(name: &str, schema: Value) -> SchemaRegistry {
        let mut map = std::collections::HashMap::new();
        map.insert(name.to_string(), serde_json::to_vec(&schema).unwrap());
        SchemaRegistry::new(MapSource(map))
    }

    #[test]
    fn accepts_valid_payload() {
        let registry = registry_with(
            "ocpp16/Heartbeat.json",
            json!({"type": "object", "additionalProperties": false}),
        );
        assert!(registry.validate("ocpp16/Heartbeat.json", &json!({})).is_ok());
    }

    #[test]
    fn rejects_payload_violating_schema() {
        let registry = registry_with(
            "ocpp16/Authorize.json",
            json!({
                "type": "object",
                "properties": {"idTag": {"type": "string"}},
                "required": ["idTag"],
                "additionalProperties": false
            }),
        );
        let err = registry
            .validate("ocpp16/Authorize.json", &json!({"idTag": 42}))
            .unwrap_err();
        match err {
            ValidateError::Violation(v) => assert_eq!(v.location, "/idTag"),
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn unknown_schema_is_not_a_violation() {
        let registry = registry_with("a.json", json!({"type": "object"}));
        let err = registry.validate("b.json", &json!({})).unwrap_err();
        assert!(matches!(
            err,
            ValidateError::Schema(SchemaError::NotFound(_))
        ));
    }

    #[test]
    fn schemas_are_compiled_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingSource(Arc<AtomicUsize>);
        impl SchemaSource for CountingSource {
            fn load(&self, _name: &str) -> Result<Vec<u8>, SchemaError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(br#"{"type": "object"}"#.to_vec())
            }
        }

        let loads = Arc::new(AtomicUsize::new(0));
        let registry = SchemaRegistry::new(CountingSource(loads.clone()));
        for _ in 0..3 {
            registry.validate("x.json", &json!({})).unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dir_source_rejects_traversal() {
        let source = DirSchemaSource::new("/tmp");
        assert!(matches!(
            source.load("../etc/passwd"),
            Err(SchemaError::NotFound(_))
        ));
    }
}
