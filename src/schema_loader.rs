//! JSON Schema loading for category documents.
//!
//! The v1 contract ships as `schema/category_v1.schema.json` and is embedded
//! at build time so installed binaries validate without the source tree. A
//! path override lets editors try a schema change before it is committed.
//! The schema only checks document shape; value rules live in `conformance`.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const EMBEDDED_CATEGORY_SCHEMA: &str = include_str!("../schema/category_v1.schema.json");
const GENERATION_POINTER: &str = "/generation";

/// Result of loading and compiling a category schema.
pub struct CategorySchema {
    pub generation: String,
    compiled: JSONSchema,
}

/// Controls where the schema comes from and what generation it must declare.
#[derive(Default)]
pub struct SchemaLoadOptions<'a> {
    /// Schema file to load instead of the embedded copy.
    pub schema_path: Option<&'a Path>,
    /// Generation (`v1`, ...) the schema must declare; enforced when present.
    pub expected_generation: Option<&'a str>,
}

impl CategorySchema {
    /// Validate a parsed document, returning one message per schema error.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|err| {
                    let at = err.instance_path.to_string();
                    if at.is_empty() {
                        err.to_string()
                    } else {
                        format!("{at}: {err}")
                    }
                })
                .collect()),
        }
    }
}

/// Load the schema with default options (embedded copy, any generation).
pub fn default_category_schema() -> Result<CategorySchema> {
    load_category_schema(SchemaLoadOptions::default())
}

pub fn load_category_schema(options: SchemaLoadOptions<'_>) -> Result<CategorySchema> {
    let schema_value: Value = match options.schema_path {
        Some(path) => serde_json::from_reader(BufReader::new(
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
        ))
        .with_context(|| format!("parsing schema {}", path.display()))?,
        None => serde_json::from_str(EMBEDDED_CATEGORY_SCHEMA)
            .context("parsing embedded category schema")?,
    };

    let generation = extract_generation(&schema_value)
        .ok_or_else(|| anyhow!("schema missing a valid generation at {GENERATION_POINTER}"))?;

    if let Some(expected) = options.expected_generation {
        if expected != generation {
            bail!("schema declares generation '{generation}', expected '{expected}'");
        }
    }

    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling category schema: {err}"))?;

    Ok(CategorySchema {
        generation,
        compiled,
    })
}

fn extract_generation(schema: &Value) -> Option<String> {
    let generation = schema.pointer(GENERATION_POINTER).and_then(Value::as_str)?;
    if !generation.is_empty()
        && generation
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(generation.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn embedded_schema_declares_v1() {
        let schema = default_category_schema().unwrap();
        assert_eq!(schema.generation, "v1");
    }

    #[test]
    fn rejects_generation_mismatch() {
        let err = load_category_schema(SchemaLoadOptions {
            expected_generation: Some("v2"),
            ..Default::default()
        })
        .err()
        .expect("mismatch should fail");
        assert!(err.to_string().contains("expected 'v2'"));
    }

    #[test]
    fn reports_shape_errors_with_paths() {
        let schema = default_category_schema().unwrap();
        let doc = json!({
            "categoryId": "bedding_sleep",
            "version": "three",
            "lastUpdated": "2025-12-01",
            "items": {}
        });
        let errors = schema.validate(&doc).unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("/version")), "{errors:?}");
    }

    #[test]
    fn loads_schema_from_override_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({"generation": "v9", "type": "object", "required": ["categoryId"]})
        )
        .unwrap();
        let schema = load_category_schema(SchemaLoadOptions {
            schema_path: Some(file.path()),
            expected_generation: Some("v9"),
        })
        .unwrap();
        assert!(schema.validate(&json!({"categoryId": "x"})).is_ok());
        assert!(schema.validate(&json!({})).is_err());
    }
}
