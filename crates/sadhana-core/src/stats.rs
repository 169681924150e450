//! Aggregate statistics as served by the stats endpoint, plus the
//! dashboard helpers built on top of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::round::ROUND;

/// Number of sessions compared side by side on the dashboard.
pub const COMPARISON_SESSIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChakraSeconds {
    pub chakra: String,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecentSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_duration: u64,
    pub total_retention: u64,
    pub records: Vec<ChakraSeconds>,
}

/// Missing fields default to zero/empty so a partial payload still renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub session_count: u64,
    pub total_duration: u64,
    pub average_duration: u64,
    pub best_retention: u64,
    pub last_session_at: Option<DateTime<Utc>>,
    /// Newest first, at most five.
    pub recent_sessions: Vec<RecentSession>,
}

/// `125` -> `"2m 5s"`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Retention recorded for `chakra_name` in a session.
///
/// Older sessions may store a shortened chakra name, so when there is no
/// exact match the first word of the name is matched case-insensitively.
pub fn retention_for_chakra(records: &[ChakraSeconds], chakra_name: &str) -> u64 {
    if let Some(exact) = records.iter().find(|r| r.chakra == chakra_name) {
        return exact.seconds;
    }
    let normalized = chakra_name.to_lowercase();
    let first_word = normalized.split(' ').next().unwrap_or_default();
    records
        .iter()
        .find(|r| r.chakra.to_lowercase().contains(first_word))
        .map(|r| r.seconds)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonColumn {
    pub session_id: String,
    /// "Sessie N", oldest compared session is 1.
    pub label: String,
    /// Day and month, e.g. "01-03".
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub chakra: &'static str,
    pub seconds: Vec<u64>,
}

/// Per-chakra retention across the most recent sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonTable {
    pub columns: Vec<ComparisonColumn>,
    pub rows: Vec<ComparisonRow>,
    pub totals: Vec<u64>,
}

/// Build the comparison table, or `None` without any stored session.
pub fn comparison_table(stats: &UserStats) -> Option<ComparisonTable> {
    let sessions: Vec<&RecentSession> = stats
        .recent_sessions
        .iter()
        .take(COMPARISON_SESSIONS)
        .collect();
    if sessions.is_empty() {
        return None;
    }

    let count = sessions.len();
    let columns = sessions
        .iter()
        .enumerate()
        .map(|(i, s)| ComparisonColumn {
            session_id: s.id.clone(),
            label: format!("Sessie {}", count - i),
            date: s.created_at.format("%d-%m").to_string(),
        })
        .collect();
    let rows = ROUND
        .iter()
        .map(|stage| ComparisonRow {
            chakra: stage.name,
            seconds: sessions
                .iter()
                .map(|s| retention_for_chakra(&s.records, stage.name))
                .collect(),
        })
        .collect();
    let totals = sessions.iter().map(|s| s.total_retention).collect();

    Some(ComparisonTable {
        columns,
        rows,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(chakra: &str, seconds: u64) -> ChakraSeconds {
        ChakraSeconds {
            chakra: chakra.into(),
            seconds,
        }
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3600), "60m 0s");
    }

    #[test]
    fn retention_prefers_exact_match() {
        let records = vec![record("Hart", 4), record("Hart (Anahata)", 30)];
        assert_eq!(retention_for_chakra(&records, "Hart (Anahata)"), 30);
    }

    #[test]
    fn retention_falls_back_to_first_word() {
        let records = vec![record("wortel", 12)];
        assert_eq!(retention_for_chakra(&records, "Wortel (Muladhara)"), 12);
        assert_eq!(retention_for_chakra(&records, "Kroon (Sahasrara)"), 0);
    }

    #[test]
    fn stats_payload_tolerates_missing_fields() {
        let stats: UserStats = serde_json::from_str(r#"{"sessionCount": 3}"#).unwrap();
        assert_eq!(stats.session_count, 3);
        assert_eq!(stats.best_retention, 0);
        assert!(stats.recent_sessions.is_empty());
        assert!(stats.last_session_at.is_none());
    }

    #[test]
    fn comparison_table_labels_newest_session_highest() {
        let session = |id: &str, day: u32, total: u64| RecentSession {
            id: id.into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
            total_duration: 900,
            total_retention: total,
            records: vec![record("Wortel (Muladhara)", total)],
        };
        let stats = UserStats {
            recent_sessions: vec![
                session("c", 3, 40),
                session("b", 2, 30),
                session("a", 1, 20),
            ],
            ..UserStats::default()
        };

        let table = comparison_table(&stats).unwrap();
        assert_eq!(table.columns[0].label, "Sessie 3");
        assert_eq!(table.columns[0].date, "03-03");
        assert_eq!(table.columns[2].label, "Sessie 1");
        assert_eq!(table.rows.len(), 7);
        assert_eq!(table.rows[0].seconds, vec![40, 30, 20]);
        assert_eq!(table.rows[6].seconds, vec![0, 0, 0]);
        assert_eq!(table.totals, vec![40, 30, 20]);
    }

    #[test]
    fn comparison_table_needs_sessions() {
        assert!(comparison_table(&UserStats::default()).is_none());
    }
}
