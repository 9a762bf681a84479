use futures::TryStreamExt;
use mongodb::bson::{doc, from_document};
use mongodb::{Collection, Database};
use serenity::async_trait;

use crate::error::BotError;
use crate::model::{ClanCensusRow, PlayerRecord, PlayerSummary, QuerySpec};

/// Read-only access to the player records store. The bot issues exactly
/// three query shapes; everything else the store might support is unused.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Case-insensitive name substring + exact server, bounded by
    /// `query.limit`, with current level/clan extracted per record.
    async fn search_players(&self, query: &QuerySpec) -> Result<Vec<PlayerSummary>, BotError>;

    /// Exact lookup by `name@server` composite key.
    async fn find_player(
        &self,
        name: &str,
        server: &str,
    ) -> Result<Option<PlayerRecord>, BotError>;

    /// Per-class member counts over players whose current clan and server
    /// match. Group order is store-defined.
    async fn clan_census(&self, server: &str, clan: &str)
        -> Result<Vec<ClanCensusRow>, BotError>;
}

/// MongoDB-backed store. Holds a handle into the pooled client created at
/// startup; aggregation work (limit, `$last`, grouping) runs server-side.
pub struct MongoStore {
    players: Collection<PlayerRecord>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        MongoStore {
            players: db.collection("user"),
        }
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn search_players(&self, query: &QuerySpec) -> Result<Vec<PlayerSummary>, BotError> {
        let pipeline = vec![
            doc! { "$match": {
                "name": { "$regex": query.name_pattern(), "$options": "si" },
                "server": &query.server,
            } },
            doc! { "$limit": query.limit as i64 },
            doc! { "$addFields": {
                "last_level": { "$last": "$level.lvl" },
                "last_clan": { "$last": "$clan.clan" },
            } },
            doc! { "$project": {
                "_id": 0,
                "name": 1,
                "last_level": 1,
                "last_clan": 1,
                "class": 1,
            } },
        ];
        let mut cursor = self.players.aggregate(pipeline).await?;
        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            rows.push(from_document(document)?);
        }
        Ok(rows)
    }

    async fn find_player(
        &self,
        name: &str,
        server: &str,
    ) -> Result<Option<PlayerRecord>, BotError> {
        let key = PlayerRecord::composite_key(name, server);
        Ok(self.players.find_one(doc! { "id": key }).await?)
    }

    async fn clan_census(
        &self,
        server: &str,
        clan: &str,
    ) -> Result<Vec<ClanCensusRow>, BotError> {
        let pipeline = vec![
            doc! { "$project": { "_id": 0, "clan": 1, "server": 1, "class": 1 } },
            doc! { "$match": { "server": server } },
            doc! { "$addFields": { "last_clan": { "$last": "$clan.clan" } } },
            doc! { "$match": { "last_clan": clan } },
            doc! { "$group": { "_id": "$class", "num": { "$sum": 1 } } },
        ];
        let mut cursor = self.players.aggregate(pipeline).await?;
        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            rows.push(from_document(document)?);
        }
        Ok(rows)
    }
}

/// In-memory store with semantics identical to the MongoDB pipelines,
/// for exercising command handling without a live database.
#[cfg(test)]
pub struct MemoryStore {
    records: Vec<PlayerRecord>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        MemoryStore { records }
    }

    /// Client-side equivalent of the `$regex`/`si` name filter.
    fn matches_name(query: &QuerySpec, candidate: &str) -> bool {
        regex::RegexBuilder::new(&query.name_pattern())
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map(|re| re.is_match(candidate))
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[async_trait]
impl RecordStore for MemoryStore {
    async fn search_players(&self, query: &QuerySpec) -> Result<Vec<PlayerSummary>, BotError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.server == query.server && Self::matches_name(query, &r.name))
            .take(query.limit)
            .map(|r| PlayerSummary {
                name: r.name.clone(),
                class: r.class.clone(),
                last_level: r.level.last().map(|entry| entry.lvl),
                last_clan: r.clan.last().map(|entry| entry.clan.clone()),
            })
            .collect())
    }

    async fn find_player(
        &self,
        name: &str,
        server: &str,
    ) -> Result<Option<PlayerRecord>, BotError> {
        let key = PlayerRecord::composite_key(name, server);
        Ok(self.records.iter().find(|r| r.id == key).cloned())
    }

    async fn clan_census(
        &self,
        server: &str,
        clan: &str,
    ) -> Result<Vec<ClanCensusRow>, BotError> {
        // BTreeMap keeps group order deterministic for tests; the real
        // store makes no ordering promise.
        let mut groups = std::collections::BTreeMap::new();
        for record in &self.records {
            let current_clan = record.clan.last().map(|entry| entry.clan.as_str());
            if record.server == server && current_clan == Some(clan) {
                *groups.entry(record.class.clone()).or_insert(0u64) += 1;
            }
        }
        Ok(groups
            .into_iter()
            .map(|(class, members)| ClanCensusRow { class, members })
            .collect())
    }
}
