use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Hard cap on `.players` search results.
pub const PLAYER_LIMIT: usize = 10;

/// One entry of a player's clan membership history, chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanEntry {
    pub clan: String,
    pub date: DateTime,
}

/// One entry of a player's level history, chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelEntry {
    pub lvl: i64,
    pub date: DateTime,
}

/// A stored player document. `id` is the `name@server` composite key; the
/// history vectors are never empty for persisted records (the ingestion
/// process writes the first entry when it creates the document).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub server: String,
    pub class: String,
    #[serde(default)]
    pub clan: Vec<ClanEntry>,
    #[serde(default)]
    pub level: Vec<LevelEntry>,
}

impl PlayerRecord {
    pub fn composite_key(name: &str, server: &str) -> String {
        format!("{name}@{server}")
    }
}

/// Parameters for the multi-player search: exact server, case-insensitive
/// name substring, bounded result count.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub server: String,
    pub name: String,
    pub limit: usize,
}

impl QuerySpec {
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        QuerySpec {
            server: server.into(),
            name: name.into(),
            limit: PLAYER_LIMIT,
        }
    }

    /// The substring pattern handed to the store's regex filter. Arguments
    /// have passed `sanitize`, so the name never contains metacharacters.
    pub fn name_pattern(&self) -> String {
        format!(".*{}.*", self.name)
    }
}

/// Projection of a search hit: name, class and the current (last) history
/// values. The optionals only trigger for records that violate the
/// never-empty-history invariant; they render as `no data` rather than
/// failing the whole table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub last_level: Option<i64>,
    #[serde(default)]
    pub last_clan: Option<String>,
}

/// Per-class member count for one clan census. Field names mirror the
/// `$group` stage output (`_id` = class, `num` = count).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClanCensusRow {
    #[serde(rename = "_id")]
    pub class: String,
    #[serde(rename = "num")]
    pub members: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_shape() {
        assert_eq!(PlayerRecord::composite_key("Alice", "east1"), "Alice@east1");
    }

    #[test]
    fn search_defaults_to_the_fixed_limit() {
        let query = QuerySpec::new("east1", "bo");
        assert_eq!(query.limit, PLAYER_LIMIT);
        assert_eq!(query.name_pattern(), ".*bo.*");
    }
}
