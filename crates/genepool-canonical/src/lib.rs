//! Canonical JSON serialization and SHA-256 content addressing.
//!
//! Gene, capsule, and event identities are self-verifying content hashes:
//! `"sha256:" + sha256(canonicalize(asset without its id field))`. The
//! canonical form is deterministic (UTF-8, object keys sorted
//! lexicographically, no insignificant whitespace), so two structurally
//! equal values always hash identically regardless of field order at the
//! producer.
//!
//! Non-finite floats cannot appear in the preimage: `serde_json::Number`
//! rejects NaN and infinities at construction, so every representable
//! value canonicalizes.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Prefix carried by every content-addressed identifier.
pub const SHA256_PREFIX: &str = "sha256:";

/// Errors from canonicalization and content-id verification.
#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("value does not serialize to JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("content id must carry the sha256: prefix, got: {declared}")]
    MissingPrefix { declared: String },

    #[error("content id mismatch: expected {expected}, declared {declared}")]
    Mismatch { expected: String, declared: String },

    #[error("content-addressed value must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Render a JSON value in canonical form.
pub fn canonicalize(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Canonical form of any serializable value.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = serde_json::to_value(value)?;
    Ok(canonicalize(&json))
}

/// Hex SHA-256 digest of a value's canonical form.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex_digest(&hasher.finalize()))
}

/// Compute the `sha256:`-prefixed content id of an object, excluding the id
/// field itself from the preimage.
///
/// Producers assign the id after computing it, so the field must not feed
/// its own hash. The field may hold any placeholder (or be absent) at
/// computation time.
pub fn content_id_excluding<T: Serialize>(
    value: &T,
    id_field: &str,
) -> Result<String, CanonicalError> {
    let mut json = serde_json::to_value(value)?;
    match json.as_object_mut() {
        Some(map) => {
            map.remove(id_field);
        }
        None => {
            return Err(CanonicalError::NotAnObject {
                kind: json_kind(&json),
            })
        }
    }
    let canonical = canonicalize(&json);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{SHA256_PREFIX}{}", hex_digest(&hasher.finalize())))
}

/// Verify a declared content id against the value it claims to address.
///
/// Returns the re-derived id on success. Fails with [`CanonicalError::MissingPrefix`]
/// when the declared id lacks the `sha256:` prefix and with
/// [`CanonicalError::Mismatch`] when the digests disagree.
pub fn verify_content_id<T: Serialize>(
    declared: &str,
    value: &T,
    id_field: &str,
) -> Result<String, CanonicalError> {
    if !declared.starts_with(SHA256_PREFIX) {
        return Err(CanonicalError::MissingPrefix {
            declared: declared.to_string(),
        });
    }
    let expected = content_id_excluding(value, id_field)?;
    if declared != expected {
        return Err(CanonicalError::Mismatch {
            expected,
            declared: declared.to_string(),
        });
    }
    Ok(expected)
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => out.push_str(&n.to_string()),
        serde_json::Value::String(s) => write_escaped(s, out),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

/// Standard JSON string escaping: quote, backslash, and control characters.
fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_sorts_object_keys() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonicalize(&a), canonicalize(&b));
        assert_eq!(canonicalize(&a), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn canonical_form_sorts_nested_keys() {
        let value = json!({"outer": {"z": [1, {"y": 2, "x": 3}], "a": null}});
        assert_eq!(
            canonicalize(&value),
            r#"{"outer":{"a":null,"z":[1,{"x":3,"y":2}]}}"#
        );
    }

    #[test]
    fn canonical_form_preserves_array_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonicalize(&value), "[3,1,2]");
    }

    #[test]
    fn canonical_form_escapes_strings() {
        let value = json!({"msg": "a\"b\\c\nd"});
        assert_eq!(canonicalize(&value), r#"{"msg":"a\"b\\c\nd"}"#);
    }

    #[test]
    fn content_hash_is_deterministic() {
        let value = json!({"summary": "fix", "confidence": 0.9});
        let first = content_hash(&value).unwrap();
        let second = content_hash(&value).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn content_id_excludes_the_id_field() {
        let with_placeholder = json!({"gene_id": "placeholder", "summary": "fix"});
        let with_real_id = json!({"gene_id": "sha256:whatever", "summary": "fix"});
        let a = content_id_excluding(&with_placeholder, "gene_id").unwrap();
        let b = content_id_excluding(&with_real_id, "gene_id").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(SHA256_PREFIX));
    }

    #[test]
    fn verify_accepts_a_correctly_sealed_value() {
        let mut value = json!({"gene_id": "", "summary": "fix", "confidence": 0.9});
        let id = content_id_excluding(&value, "gene_id").unwrap();
        value["gene_id"] = serde_json::Value::String(id.clone());
        let derived = verify_content_id(&id, &value, "gene_id").unwrap();
        assert_eq!(derived, id);
    }

    #[test]
    fn verify_rejects_mutation_after_sealing() {
        let mut value = json!({"gene_id": "", "summary": "fix"});
        let id = content_id_excluding(&value, "gene_id").unwrap();
        value["gene_id"] = serde_json::Value::String(id.clone());
        value["summary"] = serde_json::Value::String("tampered".into());
        let err = verify_content_id(&id, &value, "gene_id").unwrap_err();
        assert!(matches!(err, CanonicalError::Mismatch { .. }));
    }

    #[test]
    fn verify_rejects_missing_prefix() {
        let value = json!({"gene_id": "deadbeef", "summary": "fix"});
        let err = verify_content_id("deadbeef", &value, "gene_id").unwrap_err();
        assert!(matches!(err, CanonicalError::MissingPrefix { .. }));
    }

    #[test]
    fn content_id_requires_an_object() {
        let err = content_id_excluding(&json!([1, 2, 3]), "id").unwrap_err();
        assert!(matches!(err, CanonicalError::NotAnObject { kind: "array" }));
    }

    #[test]
    fn typed_gene_seals_and_verifies() {
        use genepool_types::{Gene, ValidationPlan, ValidationTask};

        let mut gene = Gene {
            gene_id: String::new(),
            summary: "Link against legacy CRT".into(),
            signals: vec!["LNK2019".into()],
            tags: vec!["win64".into()],
            preconditions: vec![],
            constraints: vec![],
            validation_plan: ValidationPlan {
                tasks: vec![ValidationTask::named("build_win64")],
                resource_limits: None,
            },
            confidence: 0.9,
            metadata: serde_json::Map::new(),
        };
        gene.gene_id = content_id_excluding(&gene, "gene_id").unwrap();
        verify_content_id(&gene.gene_id, &gene, "gene_id").unwrap();

        gene.confidence = 0.91;
        assert!(verify_content_id(&gene.gene_id, &gene, "gene_id").is_err());
    }
}
