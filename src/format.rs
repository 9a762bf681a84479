use mongodb::bson::DateTime;

use crate::model::{ClanCensusRow, PlayerRecord, PlayerSummary, PLAYER_LIMIT};

pub const PLAYERS_TABLE_HEADER: &str = "Name, Class, Level, Clan";
pub const NO_DATA: &str = "No data";
pub const NOT_FOUND: &str = "Not found";
pub const REJECTED: &str = "No special symbols allowed";

pub const HELP_TEXT: &str = "Usage:\n\
    **.players** {Server} {Player name} _Find players with similar name in a server_\n\
    **.player** {Server} {Player name} _Get stats about a player in a server_\n\
    **.clan** {Server} {Clan name} _Get stats about a clan in a server_\n";

fn year_month(date: DateTime) -> String {
    date.to_chrono().format("%Y/%m").to_string()
}

fn or_no_data<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| v.to_string())
}

/// The `.players` result table. Rows come pre-limited from the store; the
/// header restates the limit because the true match count may be larger.
pub fn players_table(rows: &[PlayerSummary]) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }
    let mut out = format!("Results limited to {PLAYER_LIMIT}\n");
    out.push_str(&format!("**[{PLAYERS_TABLE_HEADER}]**\n"));
    for row in rows {
        out.push_str(&format!(
            "{}, {}, {}, {}\n",
            row.name,
            row.class,
            or_no_data(row.last_level),
            or_no_data(row.last_clan.as_deref()),
        ));
    }
    out
}

/// The `.player` detail block. Histories render in stored (chronological)
/// order, timestamps truncated to year/month.
pub fn player_detail(record: &PlayerRecord) -> String {
    let clans = record
        .clan
        .iter()
        .map(|entry| format!("({} - {})", entry.clan, year_month(entry.date)))
        .collect::<Vec<_>>()
        .join(", ");
    let levels = record
        .level
        .iter()
        .map(|entry| format!("({} - {})", entry.lvl, year_month(entry.date)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Name: {}\nServer: {}\nClan: {}\nClass: {}\nLevel: {}\n",
        record.name, record.server, clans, record.class, levels,
    )
}

/// Text-mode census: per-class counts plus the total.
pub fn census_text(clan: &str, server: &str, rows: &[ClanCensusRow], total: u64) -> String {
    let mut out = format!("{clan} in {server} has:\n");
    for row in rows {
        out.push_str(&format!("{}: {}\n", row.class, row.members));
    }
    out.push_str(&format!("Total members: {total}"));
    out
}

/// Chart-mode census summary, also used as the pie chart title.
pub fn census_summary(clan: &str, server: &str, total: u64) -> String {
    format!("{clan} in {server} has {total} members")
}
