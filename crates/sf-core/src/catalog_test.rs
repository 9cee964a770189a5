use super::*;

#[test]
fn test_builtin_catalog_has_star_schema() {
    let catalog = TransformCatalog::builtin();
    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names, vec!["artists", "songplays", "songs", "time", "users"]);
}

#[test]
fn test_get_returns_query() {
    let catalog = TransformCatalog::builtin();
    let time = catalog.get("time").unwrap();
    assert_eq!(time.name, "time");
    assert!(time.sql.contains("FROM songplays"));
}

#[test]
fn test_unknown_transform_lists_available() {
    let catalog = TransformCatalog::builtin();
    let err = catalog.get("song_plays").unwrap_err();
    match err {
        CoreError::UnknownTransform { name, available } => {
            assert_eq!(name, "song_plays");
            assert!(available.contains("songplays"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_overrides_replace_and_extend() {
    let mut overrides = HashMap::new();
    overrides.insert("users".to_string(), "SELECT 1".to_string());
    overrides.insert("levels".to_string(), "SELECT DISTINCT level FROM users".to_string());

    let catalog = TransformCatalog::with_overrides(&overrides);
    assert_eq!(catalog.names().count(), 6);
    assert_eq!(catalog.get("users").unwrap().sql, "SELECT 1");
    assert!(catalog.get("levels").is_ok());
}

#[test]
fn test_empty_catalog() {
    let catalog = TransformCatalog::empty();
    assert_eq!(catalog.names().count(), 0);
    assert!(catalog.get("songs").is_err());
}
