use crate::chart::{render_census_pie, ChartArtifact, ChartSeries};
use crate::config::CensusMode;
use crate::error::BotError;
use crate::format;
use crate::model::QuerySpec;
use crate::sanitize::sanitize;
use crate::store::RecordStore;

/// A recognized command and its raw arguments. The first token after the
/// command name is the server; the remaining tokens form the (possibly
/// multi-word) player or clan name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Players { server: String, name: String },
    Player { server: String, name: String },
    Clan { server: String, name: String },
    Help,
}

fn split_args(content: &str) -> (String, String) {
    let mut tokens = content.split(' ').skip(1);
    let server = tokens.next().unwrap_or_default().to_string();
    let name = tokens.collect::<Vec<_>>().join(" ");
    (server, name)
}

/// Maps message text to a command, or `None` when no prefix matches (the
/// bot stays silent for unrelated chatter). `.players` is tested before
/// `.player` because the latter is a prefix of the former.
pub fn parse(content: &str) -> Option<Command> {
    if content.starts_with(".players") {
        let (server, name) = split_args(content);
        Some(Command::Players { server, name })
    } else if content.starts_with(".player") {
        let (server, name) = split_args(content);
        Some(Command::Player { server, name })
    } else if content.starts_with(".clan") {
        let (server, name) = split_args(content);
        Some(Command::Clan { server, name })
    } else if content.starts_with(".help") {
        Some(Command::Help)
    } else {
        None
    }
}

/// What goes back to the originating channel.
#[derive(Debug)]
pub enum Reply {
    Text(String),
    /// A rendered chart; the artifact deletes its temp file when dropped,
    /// which the dispatcher does right after sending.
    Chart(ChartArtifact),
}

/// Runs one message to completion: parse, validate, query, shape, render.
/// `Ok(None)` means no recognized command and no reply. Errors are scoped
/// to this message; the caller logs them and moves on.
pub async fn respond(
    store: &dyn RecordStore,
    mode: CensusMode,
    content: &str,
) -> Result<Option<Reply>, BotError> {
    let Some(command) = parse(content) else {
        return Ok(None);
    };

    let reply = match command {
        Command::Players { server, name } => {
            if !sanitize(&[server.as_str(), name.as_str()]) {
                Reply::Text(format::REJECTED.to_string())
            } else {
                let rows = store.search_players(&QuerySpec::new(server, name)).await?;
                Reply::Text(format::players_table(&rows))
            }
        }
        Command::Player { server, name } => {
            if !sanitize(&[server.as_str(), name.as_str()]) {
                Reply::Text(format::REJECTED.to_string())
            } else {
                match store.find_player(&name, &server).await? {
                    None => Reply::Text(format::NOT_FOUND.to_string()),
                    Some(record) => Reply::Text(format::player_detail(&record)),
                }
            }
        }
        Command::Clan { server, name } => {
            if !sanitize(&[server.as_str(), name.as_str()]) {
                Reply::Text(format::REJECTED.to_string())
            } else {
                let rows = store.clan_census(&server, &name).await?;
                let total: u64 = rows.iter().map(|row| row.members).sum();
                if total == 0 {
                    Reply::Text(format::NOT_FOUND.to_string())
                } else {
                    match mode {
                        CensusMode::Text => {
                            Reply::Text(format::census_text(&name, &server, &rows, total))
                        }
                        CensusMode::Chart => {
                            let series = ChartSeries::from_census(&rows)?;
                            let title = format::census_summary(&name, &server, total);
                            Reply::Chart(render_census_pie(&series, &title)?)
                        }
                    }
                }
            }
        }
        Command::Help => Reply::Text(format::HELP_TEXT.to_string()),
    };
    Ok(Some(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClanEntry, LevelEntry, PlayerRecord};
    use crate::store::MemoryStore;
    use mongodb::bson::DateTime;

    fn record(
        name: &str,
        server: &str,
        class: &str,
        clans: &[&str],
        levels: &[i64],
    ) -> PlayerRecord {
        PlayerRecord {
            id: PlayerRecord::composite_key(name, server),
            name: name.to_string(),
            server: server.to_string(),
            class: class.to_string(),
            clan: clans
                .iter()
                .enumerate()
                .map(|(i, clan)| ClanEntry {
                    clan: (*clan).to_string(),
                    date: DateTime::from_millis(i as i64 * 86_400_000),
                })
                .collect(),
            level: levels
                .iter()
                .enumerate()
                .map(|(i, lvl)| LevelEntry {
                    lvl: *lvl,
                    date: DateTime::from_millis(i as i64 * 86_400_000),
                })
                .collect(),
        }
    }

    fn text_of(reply: Option<Reply>) -> String {
        match reply {
            Some(Reply::Text(text)) => text,
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    #[test]
    fn parse_recognizes_the_four_prefixes() {
        assert_eq!(
            parse(".players east1 Bob Smith"),
            Some(Command::Players {
                server: "east1".into(),
                name: "Bob Smith".into(),
            })
        );
        assert_eq!(
            parse(".player east1 Alice"),
            Some(Command::Player {
                server: "east1".into(),
                name: "Alice".into(),
            })
        );
        assert_eq!(
            parse(".clan east1 The Shadows"),
            Some(Command::Clan {
                server: "east1".into(),
                name: "The Shadows".into(),
            })
        );
        assert_eq!(parse(".help"), Some(Command::Help));
    }

    #[test]
    fn parse_ignores_everything_else() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("players east1 Bob"), None);
        assert_eq!(parse(".stats east1"), None);
    }

    #[test]
    fn parse_tolerates_missing_arguments() {
        assert_eq!(
            parse(".players"),
            Some(Command::Players {
                server: String::new(),
                name: String::new(),
            })
        );
    }

    #[tokio::test]
    async fn unrelated_chatter_gets_no_reply() {
        let store = MemoryStore::new(vec![]);
        let reply = respond(&store, CensusMode::Text, "good morning")
            .await
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn special_symbols_are_rejected_before_the_store() {
        let store = MemoryStore::new(vec![]);
        for content in [".players east-1 Bob", ".player east1 Bob!", ".clan east1 $ne"] {
            let reply = respond(&store, CensusMode::Text, content).await.unwrap();
            assert_eq!(text_of(reply), "No special symbols allowed");
        }
    }

    #[tokio::test]
    async fn players_with_no_matches_is_no_data() {
        let store = MemoryStore::new(vec![record("Alice", "east1", "Mage", &["A"], &[10])]);
        let reply = respond(&store, CensusMode::Text, ".players east1 Bob")
            .await
            .unwrap();
        assert_eq!(text_of(reply), "No data");
    }

    #[tokio::test]
    async fn players_table_is_capped_at_ten_rows() {
        let records = (0..12i64)
            .map(|i| {
                record(
                    &format!("Bob{i}"),
                    "east1",
                    "Warrior",
                    &["Shadows"],
                    &[20 + i],
                )
            })
            .collect();
        let store = MemoryStore::new(records);
        let reply = respond(&store, CensusMode::Text, ".players east1 Bo")
            .await
            .unwrap();
        let text = text_of(reply);
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines[0], "Results limited to 10");
        assert_eq!(lines[1], "**[Name, Class, Level, Clan]**");
        assert_eq!(lines.len(), 12); // limit line + header + 10 rows
        assert_eq!(lines[2], "Bob0, Warrior, 20, Shadows");
    }

    #[tokio::test]
    async fn players_search_ignores_case_and_other_servers() {
        let store = MemoryStore::new(vec![
            record("Bobby", "east1", "Mage", &["Embers"], &[12]),
            record("Bobby", "west2", "Mage", &["Embers"], &[12]),
        ]);
        let reply = respond(&store, CensusMode::Text, ".players east1 BOB")
            .await
            .unwrap();
        let text = text_of(reply);
        assert!(text.contains("Bobby, Mage, 12, Embers"));
        assert_eq!(text.matches("Bobby").count(), 1);
    }

    #[tokio::test]
    async fn player_lookup_misses_are_not_found() {
        let store = MemoryStore::new(vec![record("Alice", "west2", "Druid", &["A"], &[10])]);
        let reply = respond(&store, CensusMode::Text, ".player east1 Alice")
            .await
            .unwrap();
        assert_eq!(text_of(reply), "Not found");
    }

    #[tokio::test]
    async fn player_detail_is_idempotent() {
        let store = MemoryStore::new(vec![record(
            "Alice",
            "east1",
            "Druid",
            &["Embers", "Shadows"],
            &[30, 45],
        )]);
        let first = text_of(
            respond(&store, CensusMode::Text, ".player east1 Alice")
                .await
                .unwrap(),
        );
        let second = text_of(
            respond(&store, CensusMode::Text, ".player east1 Alice")
                .await
                .unwrap(),
        );
        assert_eq!(first, second);
        assert!(first.starts_with("Name: Alice\nServer: east1\n"));
        assert!(first.ends_with('\n'));
    }

    #[tokio::test]
    async fn clan_census_text_mode_counts_current_members() {
        let store = MemoryStore::new(vec![
            record("A", "east1", "Warrior", &["Shadows"], &[10]),
            record("B", "east1", "Warrior", &["Shadows"], &[11]),
            record("C", "east1", "Warrior", &["Embers", "Shadows"], &[12]),
            record("D", "east1", "Mage", &["Shadows"], &[13]),
            record("E", "east1", "Mage", &["Shadows", "Embers"], &[14]), // left the clan
            record("F", "west2", "Mage", &["Shadows"], &[15]),           // wrong server
        ]);
        let reply = respond(&store, CensusMode::Text, ".clan east1 Shadows")
            .await
            .unwrap();
        assert_eq!(
            text_of(reply),
            "Shadows in east1 has:\nMage: 1\nWarrior: 3\nTotal members: 4"
        );
    }

    #[tokio::test]
    async fn clan_census_chart_mode_yields_a_png_that_cleans_up() {
        let store = MemoryStore::new(vec![
            record("A", "east1", "Warrior", &["Shadows"], &[10]),
            record("B", "east1", "Warrior", &["Shadows"], &[11]),
            record("C", "east1", "Warrior", &["Shadows"], &[12]),
            record("D", "east1", "Mage", &["Shadows"], &[13]),
            record("E", "east1", "Mage", &["Shadows"], &[14]),
        ]);
        let reply = respond(&store, CensusMode::Chart, ".clan east1 Shadows")
            .await
            .unwrap();
        let artifact = match reply {
            Some(Reply::Chart(artifact)) => artifact,
            other => panic!("expected a chart reply, got {other:?}"),
        };
        let path = artifact.path().to_path_buf();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clan_census_with_no_members_is_not_found() {
        let store = MemoryStore::new(vec![record("A", "east1", "Mage", &["Embers"], &[10])]);
        let reply = respond(&store, CensusMode::Chart, ".clan east1 Shadows")
            .await
            .unwrap();
        assert_eq!(text_of(reply), "Not found");
    }

    #[tokio::test]
    async fn chart_mode_fails_hard_on_unmapped_class() {
        let store = MemoryStore::new(vec![
            record("A", "east1", "Warrior", &["Shadows"], &[10]),
            record("B", "east1", "Necromancer", &["Shadows"], &[11]),
        ]);
        let result = respond(&store, CensusMode::Chart, ".clan east1 Shadows").await;
        assert!(matches!(
            result,
            Err(BotError::UnknownClass(name)) if name == "Necromancer"
        ));
    }

    #[tokio::test]
    async fn help_needs_no_store() {
        let store = MemoryStore::new(vec![]);
        let text = text_of(respond(&store, CensusMode::Text, ".help").await.unwrap());
        assert!(text.starts_with("Usage:\n"));
        assert!(text.contains("**.players**"));
        assert!(text.contains("**.player**"));
        assert!(text.contains("**.clan**"));
    }
}
