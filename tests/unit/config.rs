use super::*;

#[test]
fn test_default_rules() {
    let rules = RuleConfig::default();
    assert!(rules.diacritics);
    assert!(!rules.case_sensitive);
    assert_eq!(rules.accuracy, Accuracy::Partial);
    assert_eq!(rules.wildcards, Wildcards::Disabled);
    assert!(rules.block_boundary.is_none());
    assert!(!rules.uses_joiners());
}

#[test]
fn test_accuracy_from_name() {
    let rules: RuleConfig = serde_json::from_str(r#"{"accuracy": "exactly"}"#).unwrap();
    assert_eq!(rules.accuracy, Accuracy::Exact(Vec::new()));

    let rules: RuleConfig = serde_json::from_str(r#"{"accuracy": "complementary"}"#).unwrap();
    assert_eq!(rules.accuracy, Accuracy::Complementary(Vec::new()));
}

#[test]
fn test_accuracy_with_limiters() {
    let rules: RuleConfig = serde_json::from_str(
        r#"{"accuracy": {"value": "exactly", "limiters": [",", "."]}}"#,
    )
    .unwrap();
    assert_eq!(
        rules.accuracy,
        Accuracy::Exact(vec![",".to_string(), ".".to_string()])
    );
}

#[test]
fn test_unknown_accuracy_is_rejected() {
    let parsed: std::result::Result<RuleConfig, serde_json::Error> =
        serde_json::from_str(r#"{"accuracy": "fuzzy"}"#);
    assert!(parsed.is_err());
}

#[test]
fn test_synonyms_accept_string_or_list() {
    let rules: RuleConfig = serde_json::from_str(
        r#"{"synonyms": {"lorem": "ipsum", "one": ["1", "uno"]}}"#,
    )
    .unwrap();
    assert_eq!(rules.synonyms["lorem"].values(), vec!["ipsum"]);
    assert_eq!(rules.synonyms["one"].values(), vec!["1", "uno"]);
}

#[test]
fn test_wildcards_names() {
    let rules: RuleConfig = serde_json::from_str(r#"{"wildcards": "withSpaces"}"#).unwrap();
    assert_eq!(rules.wildcards, Wildcards::WithSpaces);
}

#[test]
fn test_block_boundary_tags() {
    let boundary = BlockBoundary::default();
    assert!(boundary.is_block("div"));
    assert!(boundary.is_block("P"));
    assert!(!boundary.is_block("span"));

    let replaced = BlockBoundary {
        tag_names: vec!["span".to_string()],
        ..BlockBoundary::default()
    };
    assert!(replaced.is_block("span"));
    assert!(!replaced.is_block("div"));

    let extended = BlockBoundary {
        tag_names: vec!["span".to_string()],
        extend: true,
        ..BlockBoundary::default()
    };
    assert!(extended.is_block("span"));
    assert!(extended.is_block("div"));
}

#[test]
fn test_options_validate() {
    assert!(MarkOptions::default().validate().is_ok());

    let options = MarkOptions {
        element: "".into(),
        ..MarkOptions::default()
    };
    assert!(matches!(
        options.validate(),
        Err(MarkError::ConfigurationInvalid(_))
    ));

    let options = MarkOptions {
        combine_patterns: Some(0),
        ..MarkOptions::default()
    };
    assert!(options.validate().is_err());
}

#[test]
fn test_options_from_json() {
    let options: MarkOptions = serde_json::from_str(
        r#"{
            "element": "span",
            "className": "hit",
            "acrossElements": true,
            "exclude": ["pre", ".skip"],
            "rules": {"caseSensitive": true}
        }"#,
    )
    .unwrap();
    assert_eq!(options.element, "span");
    assert_eq!(options.class_name.as_deref(), Some("hit"));
    assert!(options.across_elements);
    assert!(options.separate_word_search);
    assert_eq!(options.exclude.len(), 2);
    assert!(options.rules.case_sensitive);
    assert_eq!(options.subtree_timeout_ms, 5000);
}
