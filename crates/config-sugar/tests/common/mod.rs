//! Shared fixtures: a log-processing job registry and document helpers.

#![allow(dead_code)]

use config_sugar::loader::RegistryDefinition;
use config_sugar::{source, CodecRegistry, ConfigValue};

pub const JOB_REGISTRY: &str = r#"
categories:
  job:
    base: Job
  filter:
    base: Filter
    array: all
    default: identity
    aliases:
      chain:
        type: ChainFilter
        primary: filters
        defaults: { failFast: false }
      all: { redirect: chain, defaults: { failFast: true } }
      field: { type: FieldFilter, primary: name, inline: true }
      regex: { type: RegexFilter, primary: pattern, inline: true }
      identity: { type: IdentityFilter }
      limit: { type: LimitFilter, primary: max }
  output:
    base: Output
    class_field: kind
    aliases:
      file: { type: FileOutput, primary: path }
      console: { type: ConsoleOutput }

types:
  Job:
    category: job
    fields:
      - { name: name, type: string }
      - { name: retries, type: int }
      - { name: tags, type: string, shape: array, auto_array: true }
      - { name: filters, type: Filter, shape: array, auto_array: true }
      - { name: stages, type: Filter, shape: collection_of_arrays }
      - { name: outputs, type: Output, shape: map }
      - { name: routes, type: Output, shape: map_of_arrays }
      - { name: threshold, type: Threshold }
    defaults:
      retries: 3

  Filter: { kind: abstract, category: filter }
  ChainFilter:
    extends: Filter
    fields:
      - { name: filters, type: Filter, shape: array, auto_array: true }
      - { name: failFast, type: boolean }
  FieldFilter:
    extends: Filter
    fields:
      - { name: name, type: string }
      - { name: negate, type: boolean }
      - { name: mode, type: "enum:MatchMode" }
    defaults: { negate: false, mode: exact }
  RegexFilter:
    extends: Filter
    fields:
      - { name: pattern, type: string }
  IdentityFilter: { extends: Filter }
  LimitFilter:
    extends: Filter
    fields:
      - { name: max, type: long }

  Output: { kind: interface, category: output }
  FileOutput:
    extends: Output
    fields:
      - { name: path, type: string }
      - { name: compress, type: boolean }
    defaults: { compress: true }
  ConsoleOutput:
    extends: Output
    fields:
      - { name: pretty, type: boolean }

  Threshold:
    value_codable: true
    fields:
      - { name: value, type: double }
"#;

pub fn registry() -> CodecRegistry {
    RegistryDefinition::from_yaml_str(JOB_REGISTRY)
        .unwrap()
        .build()
        .unwrap()
}

/// Parse a YAML document
pub fn doc(yaml: &str) -> ConfigValue {
    source::from_yaml_str("test.yaml", yaml).unwrap()
}

/// Build a document from JSON
pub fn json_doc(value: serde_json::Value) -> ConfigValue {
    source::from_json_value("test.json", &value)
}
