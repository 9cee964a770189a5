use super::*;

const SPARKIFY: &str = r#"
name: sparkify
database:
  path: warehouse.duckdb
targets:
  prod:
    database:
      path: /data/prod.duckdb
retry:
  retries: 2
  delay_secs: 10
stage:
  - name: stage_events
    source_location: s3://udacity-dend/log_data
    destination_table: public.staging_events
    format: explicit_schema
    schema_file: log_json_path.json
    region: us-west-2
  - name: stage_songs
    source_location: s3://udacity-dend/song_data
    destination_table: public.staging_songs
loads:
  - name: load_songplays
    phase: fact
    destination_table: public.songplays
    key_column: songplay_id
    insert_mode: insert
    transform: songplays
  - name: load_time
    destination_table: public.time
    key_column: start_time
    insert_mode: append_new
    transform: time
quality:
  checks:
    freshness_check:
      - table: songplays
        target_column: start_time
    empty_table_check: [artists, songplays]
"#;

#[test]
fn test_parse_minimal_config() {
    let config = Config::from_yaml("name: test").unwrap();
    assert_eq!(config.name, "test");
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.retry.retries, 3);
    assert_eq!(config.retry.delay_secs, 300);
    assert!(config.loads.is_empty());
    assert!(config.quality.checks.is_empty());
}

#[test]
fn test_parse_full_config() {
    let config = Config::from_yaml(SPARKIFY).unwrap();
    assert_eq!(config.stage.len(), 2);
    assert_eq!(config.stage[0].format, StageFormat::ExplicitSchema);
    assert_eq!(config.stage[1].format, StageFormat::Auto);
    assert_eq!(config.stage[0].region.as_deref(), Some("us-west-2"));

    assert_eq!(config.loads.len(), 2);
    assert_eq!(config.loads[0].phase, LoadPhase::Fact);
    assert_eq!(config.loads[1].phase, LoadPhase::Dimension);
    assert_eq!(config.loads[0].mode().unwrap(), InsertMode::AppendAll);
    assert_eq!(config.loads[1].mode().unwrap(), InsertMode::AppendNew);
    assert_eq!(config.retry.max_attempts(), 3);
}

#[test]
fn test_check_groups_keep_declaration_order() {
    let config = Config::from_yaml(SPARKIFY).unwrap();
    let kinds: Vec<&str> = config
        .quality
        .checks
        .iter()
        .map(|g| g.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["freshness_check", "empty_table_check"]);

    let freshness = &config.quality.checks[0].targets[0];
    assert_eq!(freshness.table(), &"songplays");
    assert_eq!(freshness.column().map(|c| c.as_str()), Some("start_time"));
    assert_eq!(freshness.to_string(), "songplays.start_time");

    let empty = &config.quality.checks[1].targets;
    assert_eq!(empty.len(), 2);
    assert!(empty[0].column().is_none());
}

#[test]
fn test_unknown_insert_mode_is_deferred() {
    let yaml = r#"
name: test
loads:
  - name: load_users
    destination_table: users
    key_column: userid
    insert_mode: upsert-typo
    transform: users
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(matches!(
        config.loads[0].mode(),
        Err(CoreError::UnknownInsertMode { .. })
    ));
}

#[test]
fn test_invalid_identifier_rejected() {
    let yaml = r#"
name: test
loads:
  - name: load_users
    destination_table: "users; drop table songs"
    key_column: userid
    insert_mode: merge
    transform: users
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_duplicate_destination_rejected() {
    let yaml = r#"
name: test
loads:
  - name: a
    destination_table: users
    key_column: userid
    insert_mode: merge
    transform: users
  - name: b
    destination_table: users
    key_column: userid
    insert_mode: replace
    transform: users
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("more than one load"));
}

#[test]
fn test_duplicate_destination_under_other_spelling_rejected() {
    for other in ["main.users", "Users"] {
        let yaml = format!(
            r#"
name: test
loads:
  - name: a
    destination_table: users
    key_column: userid
    insert_mode: merge
    transform: users
  - name: b
    destination_table: {other}
    key_column: userid
    insert_mode: replace
    transform: users
"#
        );
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("more than one load"), "{other}");
    }
}

#[test]
fn test_same_name_in_other_schema_allowed() {
    let yaml = r#"
name: test
loads:
  - name: a
    destination_table: users
    key_column: userid
    insert_mode: merge
    transform: users
  - name: b
    destination_table: archive.users
    key_column: userid
    insert_mode: replace
    transform: users
"#;
    assert_eq!(Config::from_yaml(yaml).unwrap().loads.len(), 2);
}

#[test]
fn test_duplicate_stage_destination_rejected() {
    let yaml = r#"
name: test
stage:
  - name: stage_a
    source_location: data/a
    destination_table: staging_songs
  - name: stage_b
    source_location: data/b
    destination_table: STAGING_SONGS
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("more than one stage task"));
}

#[test]
fn test_explicit_schema_requires_schema_file() {
    let yaml = r#"
name: test
stage:
  - name: stage_events
    source_location: data/log_data
    destination_table: staging_events
    format: explicit-schema
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, CoreError::InvalidStageFormat { .. }));
}

#[test]
fn test_unknown_top_level_field_rejected() {
    let err = Config::from_yaml("name: test\nschedule: hourly").unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_get_database_config_with_target() {
    let config = Config::from_yaml(SPARKIFY).unwrap();
    assert_eq!(
        config.get_database_config(None).unwrap().path,
        "warehouse.duckdb"
    );
    assert_eq!(
        config.get_database_config(Some("prod")).unwrap().path,
        "/data/prod.duckdb"
    );
    assert!(config.get_database_config(Some("staging")).is_err());
}

#[test]
fn test_loads_in_phase() {
    let config = Config::from_yaml(SPARKIFY).unwrap();
    let facts: Vec<&str> = config
        .loads_in_phase(LoadPhase::Fact)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(facts, vec!["load_songplays"]);
}

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("starflow.yaml"), "name: from_dir").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "from_dir");

    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::load_from_dir(empty.path()),
        Err(CoreError::ConfigNotFound { .. })
    ));
}
