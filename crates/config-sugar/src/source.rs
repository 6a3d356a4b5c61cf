//! Source adapters: JSON and YAML text into origin-tracked value trees.
//!
//! Origins read `<source>: <dotted.path>`, with `<source>: root` for the
//! document root.

use config_types::{ConfigList, ConfigObject, ConfigValue, Origin};

use crate::error::{SugarError, SugarResult};

fn origin_at(source: &str, path: &str) -> Origin {
    if path.is_empty() {
        Origin::new(format!("{}: root", source))
    } else {
        Origin::new(format!("{}: {}", source, path))
    }
}

fn child_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

/// Parse JSON text
pub fn from_json_str(source: &str, text: &str) -> SugarResult<ConfigValue> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| SugarError::source(&Origin::new(source), e.to_string()))?;
    Ok(from_json_value(source, &value))
}

/// Convert an already parsed JSON document
pub fn from_json_value(source: &str, value: &serde_json::Value) -> ConfigValue {
    json_node(source, "", value)
}

fn json_node(source: &str, path: &str, value: &serde_json::Value) -> ConfigValue {
    let origin = origin_at(source, path);
    match value {
        serde_json::Value::Null => ConfigValue::null(origin),
        serde_json::Value::Bool(b) => ConfigValue::boolean(*b, origin),
        serde_json::Value::Number(n) => ConfigValue::number(n.clone(), origin),
        serde_json::Value::String(s) => ConfigValue::string(s.clone(), origin),
        serde_json::Value::Array(items) => {
            let list: ConfigList = items
                .iter()
                .enumerate()
                .map(|(i, item)| json_node(source, &child_path(path, &i.to_string()), item))
                .collect();
            ConfigValue::list(list, origin)
        }
        serde_json::Value::Object(map) => {
            let obj: ConfigObject = map
                .iter()
                .map(|(k, v)| (k.clone(), json_node(source, &child_path(path, k), v)))
                .collect();
            ConfigValue::object(obj, origin)
        }
    }
}

/// Parse YAML text (a single document)
pub fn from_yaml_str(source: &str, text: &str) -> SugarResult<ConfigValue> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| SugarError::source(&Origin::new(source), e.to_string()))?;
    from_yaml_value(source, &value)
}

/// Convert an already parsed YAML document.
///
/// Scalar keys are stringified; null, sequence and mapping keys are rejected.
/// Tags are dropped.
pub fn from_yaml_value(source: &str, value: &serde_yaml::Value) -> SugarResult<ConfigValue> {
    yaml_node(source, "", value)
}

fn yaml_node(source: &str, path: &str, value: &serde_yaml::Value) -> SugarResult<ConfigValue> {
    use serde_yaml::Value;

    let origin = origin_at(source, path);
    let node = match value {
        Value::Null => ConfigValue::null(origin),
        Value::Bool(b) => ConfigValue::boolean(*b, origin),
        Value::Number(n) => ConfigValue::number(yaml_number(n, &origin)?, origin),
        Value::String(s) => ConfigValue::string(s.clone(), origin),
        Value::Sequence(items) => {
            let list: ConfigList = items
                .iter()
                .enumerate()
                .map(|(i, item)| yaml_node(source, &child_path(path, &i.to_string()), item))
                .collect::<SugarResult<_>>()?;
            ConfigValue::list(list, origin)
        }
        Value::Mapping(map) => {
            let obj: ConfigObject = map
                .iter()
                .map(|(k, v)| -> SugarResult<(String, ConfigValue)> {
                    let key = yaml_key(k, &origin)?;
                    let node = yaml_node(source, &child_path(path, &key), v)?;
                    Ok((key, node))
                })
                .collect::<SugarResult<_>>()?;
            ConfigValue::object(obj, origin)
        }
        Value::Tagged(tagged) => yaml_node(source, path, &tagged.value)?,
    };
    Ok(node)
}

fn yaml_number(n: &serde_yaml::Number, origin: &Origin) -> SugarResult<serde_json::Number> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| SugarError::source(origin, format!("{} is not a finite number", n)))
}

fn yaml_key(key: &serde_yaml::Value, origin: &Origin) -> SugarResult<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Tagged(tagged) => yaml_key(&tagged.value, origin),
        Value::Null => Err(SugarError::source(origin, "mapping keys must not be null")),
        Value::Sequence(_) | Value::Mapping(_) => Err(SugarError::source(
            origin,
            "mapping keys must be scalars",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_json_origins() {
        let value = from_json_str("job.json", r#"{"source": {"filters": [1, 2]}}"#).unwrap();
        assert_eq!(value.origin().description(), "job.json: root");

        let filters = value.as_object().unwrap().get("source").unwrap();
        let second = filters
            .as_object()
            .unwrap()
            .get("filters")
            .unwrap()
            .as_list()
            .unwrap()
            .get(1)
            .unwrap();
        assert_eq!(second.origin().description(), "job.json: source.filters.1");
    }

    #[test]
    fn test_yaml_matches_json() {
        let yaml = from_yaml_str(
            "job.yaml",
            "source:\n  chain:\n    - field: user\n    - 3\n  enabled: true\n  ratio: 0.5\n",
        )
        .unwrap();
        assert_eq!(
            yaml.to_json(),
            json!({"source": {"chain": [{"field": "user"}, 3], "enabled": true, "ratio": 0.5}})
        );
    }

    #[test]
    fn test_yaml_keeps_key_order() {
        let value = from_yaml_str("doc", "zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_yaml_scalar_keys_are_stringified() {
        let value = from_yaml_str("doc", "1: one\ntrue: yes\n").unwrap();
        assert_eq!(value.to_json(), json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn test_yaml_rejects_complex_keys() {
        let err = from_yaml_str("doc", "? [a, b]\n: pair\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Source);
        assert!(err.to_string().contains("mapping keys must be scalars"));
    }

    #[test]
    fn test_yaml_rejects_non_finite_numbers() {
        let err = from_yaml_str("doc", "value: .nan\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Source);
    }

    #[test]
    fn test_parse_errors_name_the_source() {
        let err = from_json_str("broken.json", "{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Source);
        assert!(err.to_string().starts_with("broken.json: "));
    }
}
