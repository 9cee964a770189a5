//! Transform catalog: the named read queries that feed each load.
//!
//! The built-in entries produce the Sparkify star schema from the two
//! staging tables. Pipelines may add entries or override built-ins through
//! the `transforms` section of starflow.yml.

use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};

/// A named, parameter-free read query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformQuery {
    /// Catalog name
    pub name: String,

    /// SELECT statement whose projection matches the destination by position
    pub sql: String,
}

impl TransformQuery {
    /// Create a transform query
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Fact table rows: one per `NextSong` event, joined to the song metadata
pub const SONGPLAYS_SQL: &str = r#"SELECT
    md5(CAST(evt.sessionid AS VARCHAR) || CAST(evt.start_time AS VARCHAR)) AS songplay_id,
    evt.start_time,
    evt.userid,
    evt.level,
    sng.song_id,
    sng.artist_id,
    evt.sessionid,
    evt.location,
    evt.useragent
FROM (
    SELECT epoch_ms(CAST(ts AS BIGINT)) AS start_time, *
    FROM staging_events
    WHERE page = 'NextSong'
) AS evt
LEFT JOIN staging_songs AS sng
    ON evt.song = sng.title
    AND evt.artist = sng.artist_name
    AND evt.length = sng.duration"#;

/// User dimension rows
pub const USERS_SQL: &str = r#"SELECT DISTINCT userid, firstname, lastname, gender, level
FROM staging_events
WHERE page = 'NextSong' AND userid IS NOT NULL"#;

/// Song dimension rows
pub const SONGS_SQL: &str = r#"SELECT DISTINCT song_id, title, artist_id, year, duration
FROM staging_songs
WHERE song_id IS NOT NULL"#;

/// Artist dimension rows
pub const ARTISTS_SQL: &str = r#"SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM staging_songs
WHERE artist_id IS NOT NULL"#;

/// Time dimension rows, derived from the loaded fact table
pub const TIME_SQL: &str = r#"SELECT DISTINCT
    start_time,
    hour(start_time),
    day(start_time),
    week(start_time),
    month(start_time),
    year(start_time),
    dayofweek(start_time)
FROM songplays"#;

/// DDL for the staging and star-schema tables.
///
/// Keys are `NOT NULL` with no primary-key constraint; `append-all` may
/// introduce duplicate keys.
pub const STAR_SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS staging_events (
    artist VARCHAR,
    auth VARCHAR,
    firstname VARCHAR,
    gender VARCHAR,
    iteminsession INTEGER,
    lastname VARCHAR,
    length DOUBLE,
    level VARCHAR,
    location VARCHAR,
    method VARCHAR,
    page VARCHAR,
    registration DOUBLE,
    sessionid INTEGER,
    song VARCHAR,
    status INTEGER,
    ts BIGINT,
    useragent VARCHAR,
    userid INTEGER
);
CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs INTEGER,
    artist_id VARCHAR,
    artist_latitude DOUBLE,
    artist_longitude DOUBLE,
    artist_location VARCHAR,
    artist_name VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration DOUBLE,
    "year" INTEGER
);
CREATE TABLE IF NOT EXISTS songplays (
    songplay_id VARCHAR NOT NULL,
    start_time TIMESTAMP NOT NULL,
    userid INTEGER NOT NULL,
    level VARCHAR,
    song_id VARCHAR,
    artist_id VARCHAR,
    sessionid INTEGER,
    location VARCHAR,
    user_agent VARCHAR
);
CREATE TABLE IF NOT EXISTS users (
    userid INTEGER NOT NULL,
    first_name VARCHAR,
    last_name VARCHAR,
    gender VARCHAR,
    level VARCHAR
);
CREATE TABLE IF NOT EXISTS songs (
    songid VARCHAR NOT NULL,
    title VARCHAR,
    artistid VARCHAR,
    "year" INTEGER,
    duration DOUBLE
);
CREATE TABLE IF NOT EXISTS artists (
    artistid VARCHAR NOT NULL,
    name VARCHAR,
    location VARCHAR,
    latitude DOUBLE,
    longitude DOUBLE
);
CREATE TABLE IF NOT EXISTS "time" (
    start_time TIMESTAMP NOT NULL,
    "hour" INTEGER,
    "day" INTEGER,
    "week" INTEGER,
    "month" INTEGER,
    "year" INTEGER,
    weekday INTEGER
);
"#;

/// Lookup of transform queries by name
#[derive(Debug, Clone, Default)]
pub struct TransformCatalog {
    queries: BTreeMap<String, TransformQuery>,
}

impl TransformCatalog {
    /// Catalog with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in star-schema transforms
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (name, sql) in [
            ("songplays", SONGPLAYS_SQL),
            ("users", USERS_SQL),
            ("songs", SONGS_SQL),
            ("artists", ARTISTS_SQL),
            ("time", TIME_SQL),
        ] {
            catalog.insert(TransformQuery::new(name, sql));
        }
        catalog
    }

    /// Built-ins overlaid with user-defined transforms from the config
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut catalog = Self::builtin();
        for (name, sql) in overrides {
            if catalog.queries.contains_key(name) {
                log::debug!("Transform '{}' overrides the built-in query", name);
            }
            catalog.insert(TransformQuery::new(name.clone(), sql.clone()));
        }
        catalog
    }

    /// Add or replace an entry
    pub fn insert(&mut self, query: TransformQuery) {
        self.queries.insert(query.name.clone(), query);
    }

    /// Look up a transform by name
    pub fn get(&self, name: &str) -> CoreResult<&TransformQuery> {
        self.queries
            .get(name)
            .ok_or_else(|| CoreError::UnknownTransform {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Entry names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
