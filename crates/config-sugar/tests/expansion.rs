//! End-to-end expansion against the job registry.

mod common;

use common::{doc, json_doc, registry};
use config_sugar::loader::RegistryDefinition;
use config_sugar::{ErrorKind, ExpandOptions, Expander, Origin, TypeName};
use pretty_assertions::assert_eq;
use serde_json::json;

const NIGHTLY_JOB: &str = r#"
job:
  name: nightly
  tags: audit
  filters:
    - field: user
      negate: true
    - limit: 100
    - regex: "^GET"
    - - field: host
      - {}
  outputs:
    main: { file: /var/log/out.log }
    debug: { kind: console, pretty: true }
  threshold: 0.75
"#;

#[test]
fn test_expands_every_sugar_form() {
    let registry = registry();
    let out = Expander::new(&registry).expand_root(&doc(NIGHTLY_JOB)).unwrap();

    assert_eq!(
        out.to_json(),
        json!({
            "name": "nightly",
            "tags": ["audit"],
            "filters": [
                {"negate": true, "name": "user", "_primary": "name", "type": "field", "mode": "exact"},
                {"max": 100, "type": "limit", "_primary": "max"},
                {"pattern": "^GET", "type": "regex", "_primary": "pattern"},
                {
                    "type": "chain",
                    "filters": [
                        {"name": "host", "type": "field", "_primary": "name", "negate": false, "mode": "exact"},
                        {"type": "identity"}
                    ],
                    "_primary": "filters",
                    "failFast": true
                }
            ],
            "outputs": {
                "main": {"path": "/var/log/out.log", "kind": "file", "_primary": "path", "compress": true},
                "debug": {"kind": "console", "pretty": true}
            },
            "threshold": 0.75,
            "retries": 3
        })
    );
}

#[test]
fn test_idempotent_on_canonical_input() {
    let registry = registry();
    let expander = Expander::new(&registry);
    let once = expander.expand_root(&doc(NIGHTLY_JOB)).unwrap();
    let twice = expander
        .expand_root(&once.at_key("job", Origin::synthetic()))
        .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_deep_tree_expands_identically_twice() {
    let registry = registry();
    let expander = Expander::new(&registry);

    let mut filter = json!({"limit": 1});
    for _ in 0..20 {
        filter = json!({"chain": [filter, {"field": "x"}]});
    }
    let node = json_doc(filter);
    let filter_type = TypeName::new("Filter");

    let first = expander.expand(&filter_type, &node).unwrap();
    let second = expander.expand(&filter_type, &first).unwrap();
    assert_eq!(first, second);
    assert_eq!(expander.expand(&filter_type, &node).unwrap(), first);
}

#[test]
fn test_defaults_never_override_explicit_values() {
    let registry = registry();
    let expander = Expander::new(&registry);

    let out = expander
        .expand_root(&json_doc(json!({"job": {"retries": 7}})))
        .unwrap();
    assert_eq!(out.to_json()["retries"], json!(7));

    let out = expander
        .expand_root(&json_doc(json!({"job": {
            "outputs": {"o": {"file": "/tmp/x", "compress": false}}
        }})))
        .unwrap();
    assert_eq!(out.to_json()["outputs"]["o"]["compress"], json!(false));

    let out = expander
        .expand_root(&json_doc(json!({"job": {}})))
        .unwrap();
    let retries = out.as_object().unwrap().get("retries").unwrap();
    assert_eq!(retries.as_i64(), Some(3));
    assert!(retries.origin().description().starts_with("global default : "));
}

#[test]
fn test_single_key_shorthand_matches_explicit_form() {
    let registry = registry();
    let expander = Expander::new(&registry);

    let pairs = [
        (json!({"limit": 5}), json!({"type": "limit", "max": 5})),
        (
            json!({"chain": {"filters": [], "failFast": true}}),
            json!({"type": "chain", "filters": [], "failFast": true}),
        ),
        (
            json!({"all": [{"field": "a"}]}),
            json!({"type": "all", "filters": [{"type": "field", "name": "a"}]}),
        ),
    ];
    for (sugar, explicit) in pairs {
        let sugar = expander
            .expand_root(&json_doc(json!({"job": {"filters": [sugar]}})))
            .unwrap();
        let explicit = expander
            .expand_root(&json_doc(json!({"job": {"filters": [explicit]}})))
            .unwrap();
        assert_eq!(sugar, explicit);
    }
}

#[test]
fn test_ambiguous_inlined_aliases_fail() {
    let registry = registry();
    let err = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"filters": [{"field": "a", "regex": "b"}]}})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(
        err.origin().unwrap().description(),
        "test.json: job.filters.0"
    );
}

#[test]
fn test_auto_array_wrapping() {
    let registry = registry();
    let out = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"tags": "audit", "filters": {"limit": 1}}})))
        .unwrap();
    let fields = out.as_object().unwrap();

    let tags = fields.get("tags").unwrap();
    assert_eq!(tags.to_json(), json!(["audit"]));
    assert_eq!(
        tags.origin().description(),
        "auto collection of test.json: job.tags"
    );
    assert_eq!(
        fields.get("filters").unwrap().to_json(),
        json!([{"max": 1, "type": "limit", "_primary": "max"}])
    );
}

#[test]
fn test_fields_without_auto_array_require_lists() {
    let registry = registry();
    let err = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"stages": {"limit": 1}}})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.to_string().contains("stages has type OBJECT rather than LIST"));

    let err = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"outputs": ["x"]}})))
        .unwrap_err();
    assert!(err.to_string().contains("outputs has type LIST rather than OBJECT"));

    let err = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"filters": [5]}})))
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("invalid config type of NUMBER for category 'filter'"));
}

#[test]
fn test_root_arity_and_category_checks() {
    let registry = registry();
    let expander = Expander::new(&registry);

    for root in [json!({}), json!({"job": {}, "filter": {}}), json!("job")] {
        let err = expander.expand_root(&json_doc(root)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert!(err.to_string().contains("config root must have exactly one key"));
    }

    let err = expander
        .expand_root(&json_doc(json!({"jobs": {"name": "x"}})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownCategory);
    assert_eq!(
        err.to_string(),
        "test.json: jobs: jobs: top level key must be a valid category"
    );
}

#[test]
fn test_map_of_arrays_preserves_keys() {
    let registry = registry();
    let out = Expander::new(&registry)
        .expand_root(&doc(
            r#"
job:
  routes:
    errors:
      - file: /var/log/err.log
    audit:
      - file: /var/log/audit.log
      - kind: console
    empty: []
"#,
        ))
        .unwrap();

    let routes = out.as_object().unwrap().get("routes").unwrap();
    let keys: Vec<&str> = routes.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["errors", "audit", "empty"]);
    assert_eq!(
        routes.to_json(),
        json!({
            "errors": [
                {"path": "/var/log/err.log", "kind": "file", "_primary": "path", "compress": true}
            ],
            "audit": [
                {"path": "/var/log/audit.log", "kind": "file", "_primary": "path", "compress": true},
                {"kind": "console"}
            ],
            "empty": []
        })
    );
}

#[test]
fn test_nested_collections_expand_elementwise() {
    let registry = registry();
    let out = Expander::new(&registry)
        .expand_root(&json_doc(json!({"job": {"stages": [[{"limit": 1}], [{}]]}})))
        .unwrap();
    assert_eq!(
        out.to_json()["stages"],
        json!([[{"max": 1, "type": "limit", "_primary": "max"}], [{"type": "identity"}]])
    );
}

#[test]
fn test_unresolved_alias_is_reported_not_fatal() {
    let registry = registry();
    let input = json_doc(json!({"job": {"filters": [{"type": "bogus", "level": 2}]}}));

    let expansion = Expander::new(&registry)
        .expand_root_reported(&input)
        .unwrap();
    assert_eq!(
        expansion.value.to_json()["filters"],
        json!([{"type": "bogus", "level": 2}])
    );
    assert_eq!(expansion.warnings.len(), 1);
    assert_eq!(
        expansion.warnings[0].to_string(),
        "test.json: job.filters.0.type: 'bogus' is not a registered alias in category 'filter'"
    );

    let err = Expander::new(&registry)
        .with_options(ExpandOptions::default().strict())
        .expand_root(&input)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedAlias);
}

#[test]
fn test_input_tree_is_untouched() {
    let registry = registry();
    let input = doc(NIGHTLY_JOB);
    let snapshot = input.to_json();
    Expander::new(&registry).expand_root(&input).unwrap();
    assert_eq!(input.to_json(), snapshot);
}

#[test]
fn test_value_types_pass_scalars_through() {
    let registry = registry();
    let out = Expander::new(&registry)
        .expand(&TypeName::new("Threshold"), &json_doc(json!(0.5)))
        .unwrap();
    assert_eq!(out.to_json(), json!(0.5));
    assert!(out
        .origin()
        .description()
        .starts_with("unchanged for value type "));
}

#[test]
fn test_array_sugar_applies_redirect_defaults() {
    let registry = registry();
    let expander = Expander::new(&registry);

    let out = expander
        .expand_root(&json_doc(json!({"job": {"filters": [[{"limit": 2}]]}})))
        .unwrap();
    assert_eq!(
        out.to_json()["filters"],
        json!([{
            "type": "chain",
            "filters": [{"max": 2, "type": "limit", "_primary": "max"}],
            "_primary": "filters",
            "failFast": true
        }])
    );

    // the redirect's own defaults agree across every sugar form
    let single_key = expander
        .expand(&TypeName::new("Filter"), &json_doc(json!({"all": []})))
        .unwrap();
    assert_eq!(single_key.to_json()["failFast"], json!(true));
    let chain = expander
        .expand(&TypeName::new("Filter"), &json_doc(json!({"chain": []})))
        .unwrap();
    assert_eq!(chain.to_json()["failFast"], json!(false));
}

const STEP_REGISTRY: &str = r#"
categories:
  step:
    base: Step
    array: batch
    default: pass
    aliases:
      run: { type: RunStep, primary: command }
      group: { type: GroupStep, defaults: { parallel: false } }
      batch: { redirect: group, primary: steps, defaults: { parallel: true } }
      noop: { type: NoopStep }
      pass: { redirect: noop, defaults: { note: passthrough } }

types:
  Step: { kind: abstract, category: step }
  RunStep:
    extends: Step
    fields:
      - { name: command, type: string }
  GroupStep:
    extends: Step
    fields:
      - { name: steps, type: Step, shape: array }
      - { name: parallel, type: boolean }
  NoopStep:
    extends: Step
    fields:
      - { name: note, type: string }
"#;

#[test]
fn test_redirected_sugar_aliases_keep_their_primary_and_defaults() {
    let registry = RegistryDefinition::from_yaml_str(STEP_REGISTRY)
        .unwrap()
        .build()
        .unwrap();
    let expander = Expander::new(&registry);
    let step = TypeName::new("Step");

    let batch = expander
        .expand(&step, &json_doc(json!([{"run": "make"}])))
        .unwrap();
    assert_eq!(
        batch.to_json(),
        json!({
            "type": "group",
            "steps": [{"command": "make", "type": "run", "_primary": "command"}],
            "_primary": "steps",
            "parallel": true
        })
    );

    let fallback = expander.expand(&step, &json_doc(json!({}))).unwrap();
    assert_eq!(
        fallback.to_json(),
        json!({"type": "noop", "note": "passthrough"})
    );

    let explicit = expander
        .expand(&step, &json_doc(json!({"note": "kept"})))
        .unwrap();
    assert_eq!(explicit.to_json(), json!({"note": "kept", "type": "noop"}));
}
