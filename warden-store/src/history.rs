//! SQLite-backed verdict history
//!
//! One embedded database with three tables: `sites` (one row per URL,
//! upserted), `downloads` and `site_actions` (append-only). The connection
//! lives behind a mutex, which also serializes concurrent writes to the
//! same URL key.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use warden_core::{RiskLevel, SiteActionKind};
use warden_engine::{HistoryStore, StoreError};

/// A persisted `sites` row
#[derive(Debug, Clone)]
pub struct SiteRow {
    pub url: String,
    pub label: String,
    pub reason: String,
    pub reputation: i64,
    pub user_reports: i64,
    pub visits: i64,
}

/// SQLite implementation of [`HistoryStore`]
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        init_schema(&conn).map_err(unavailable)?;
        info!(path = %path.display(), "history database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        init_schema(&conn).map_err(unavailable)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fetch one site row, if present.
    pub fn site(&self, url: &str) -> Result<Option<SiteRow>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT url, label, reason, reputation, user_reports, visits
             FROM sites WHERE url = ?1",
            params![url],
            |row| {
                Ok(SiteRow {
                    url: row.get(0)?,
                    label: row.get(1)?,
                    reason: row.get(2)?,
                    reputation: row.get(3)?,
                    user_reports: row.get(4)?,
                    visits: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(query)
    }

    pub fn download_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM downloads", [], |row| row.get(0))
            .map_err(query)
    }

    pub fn action_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM site_actions", [], |row| row.get(0))
            .map_err(query)
    }

    /// Reputation adjustment for the report/override paths: a report bumps
    /// the user_reports counter, an override credits reputation.
    fn adjust_counters(&self, url: &str, action: SiteActionKind) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let sql = match action {
            SiteActionKind::Report => {
                "UPDATE sites SET user_reports = user_reports + 1 WHERE url = ?1"
            }
            SiteActionKind::Override => {
                "UPDATE sites SET reputation = reputation + 2 WHERE url = ?1"
            }
        };
        conn.execute(sql, params![url]).map_err(query)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn upsert_verdict(
        &self,
        url: &str,
        level: RiskLevel,
        reason: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        // Insert-or-ignore then update keeps visit counting atomic under
        // the connection lock.
        conn.execute(
            "INSERT OR IGNORE INTO sites (url, label, reason, visits) VALUES (?1, ?2, ?3, 0)",
            params![url, level.label(), reason],
        )
        .map_err(query)?;
        conn.execute(
            "UPDATE sites
             SET visits = visits + 1, label = ?2, reason = ?3, last_checked = CURRENT_TIMESTAMP
             WHERE url = ?1",
            params![url, level.label(), reason],
        )
        .map_err(query)?;
        debug!(url, label = level.label(), "verdict upserted");
        Ok(())
    }

    async fn append_download(
        &self,
        file: &str,
        site_url: Option<&str>,
        level: RiskLevel,
        reason: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO downloads (file, site_url, risk, reason) VALUES (?1, ?2, ?3, ?4)",
            params![file, site_url.unwrap_or(""), level.as_i64(), reason],
        )
        .map_err(query)?;
        Ok(())
    }

    async fn append_action(
        &self,
        url: &str,
        action: SiteActionKind,
        details: &str,
    ) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT INTO site_actions (url, action, details) VALUES (?1, ?2, ?3)",
                params![url, action.as_str(), details],
            )
            .map_err(query)?;
        }
        self.adjust_counters(url, action)
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT UNIQUE,
            label TEXT,
            reason TEXT,
            last_checked TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            reputation INTEGER DEFAULT 0,
            user_reports INTEGER DEFAULT 0,
            visits INTEGER DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS downloads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file TEXT,
            site_url TEXT,
            risk INTEGER,
            reason TEXT,
            last_checked TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS site_actions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT,
            action TEXT,
            timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            details TEXT
        );",
    )
}

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn query(e: rusqlite::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_creates_then_increments() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();

        store
            .upsert_verdict("http://example.com", RiskLevel::Trusted, "not flagged")
            .await
            .unwrap();
        store
            .upsert_verdict("http://example.com", RiskLevel::Risky, "listed in feed")
            .await
            .unwrap();

        let row = store.site("http://example.com").unwrap().unwrap();
        assert_eq!(row.visits, 2);
        // Last write wins on label and reason
        assert_eq!(row.label, "risky");
        assert_eq!(row.reason, "listed in feed");
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_rows() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();

        store
            .upsert_verdict("http://a.test", RiskLevel::Trusted, "ok")
            .await
            .unwrap();
        store
            .upsert_verdict("http://b.test", RiskLevel::Unknown, "long url")
            .await
            .unwrap();

        assert_eq!(store.site("http://a.test").unwrap().unwrap().visits, 1);
        assert_eq!(store.site("http://b.test").unwrap().unwrap().visits, 1);
    }

    #[tokio::test]
    async fn test_downloads_are_append_only() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();

        store
            .append_download("a.exe", Some("http://x.test"), RiskLevel::Risky, "risky type")
            .await
            .unwrap();
        store
            .append_download("a.exe", None, RiskLevel::Risky, "risky type")
            .await
            .unwrap();

        assert_eq!(store.download_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_report_action_bumps_user_reports() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store
            .upsert_verdict("http://sketchy.test", RiskLevel::Unknown, "long url")
            .await
            .unwrap();

        store
            .append_action("http://sketchy.test", SiteActionKind::Report, "popup report")
            .await
            .unwrap();

        let row = store.site("http://sketchy.test").unwrap().unwrap();
        assert_eq!(row.user_reports, 1);
        assert_eq!(row.reputation, 0);
        assert_eq!(store.action_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_override_action_credits_reputation() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store
            .upsert_verdict("http://sketchy.test", RiskLevel::Risky, "listed")
            .await
            .unwrap();

        store
            .append_action("http://sketchy.test", SiteActionKind::Override, "user proceeded")
            .await
            .unwrap();

        let row = store.site("http://sketchy.test").unwrap().unwrap();
        assert_eq!(row.reputation, 2);
        assert_eq!(row.user_reports, 0);
    }

    #[tokio::test]
    async fn test_action_on_unknown_url_still_audited() {
        let store = SqliteHistoryStore::open_in_memory().unwrap();

        // No sites row exists; the audit entry is still appended and the
        // counter update simply touches zero rows.
        store
            .append_action("http://never-seen.test", SiteActionKind::Report, "")
            .await
            .unwrap();
        assert_eq!(store.action_count().unwrap(), 1);
        assert!(store.site("http://never-seen.test").unwrap().is_none());
    }
}
