// ==========================================
// 数字仓储批量导入导出系统 - 条目仓储实现
// ==========================================
// 存储: SQLite (rusqlite bundled)
// 约束: (owner_id, identifier, object_type) 唯一,
//       重复建档复用既有行（幂等重跑）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entry::{Entry, EntryError, Row, Run};
use crate::domain::types::{EntryStatus, ObjectType, RunState};
use crate::repository::entry_repo::EntryRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteEntryRepository
// ==========================================
// Clone 共享同一底层连接（Arc 引用计数）
#[derive(Clone)]
pub struct SqliteEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntryRepository {
    /// 创建仓储实例并初始化表结构
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                identifier TEXT NOT NULL,
                object_type TEXT NOT NULL,
                run_id TEXT NOT NULL,
                parent_identifier TEXT,
                raw_metadata TEXT NOT NULL,
                parsed_metadata TEXT NOT NULL,
                status TEXT NOT NULL,
                error_json TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(owner_id, identifier, object_type)
            );

            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                state TEXT NOT NULL,
                total INTEGER NOT NULL,
                succeeded_count INTEGER NOT NULL,
                failed_count INTEGER NOT NULL,
                collections_total INTEGER NOT NULL,
                fatal_error TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT
            );
            "#,
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Entry, String, String, Option<String>)> {
        // 返回 (entry 骨架, raw_json, parsed_json, error_json),JSON 解析留给调用方
        let object_type: String = row.get("object_type")?;
        let status: String = row.get("status")?;
        let entry = Entry {
            identifier: row.get("identifier")?,
            object_type: parse_object_type(&object_type),
            owner_id: row.get("owner_id")?,
            run_id: row.get("run_id")?,
            raw_metadata: Row::new(),
            parsed_metadata: Vec::new(),
            parent_identifier: row.get("parent_identifier")?,
            status: parse_entry_status(&status),
            error: None,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        Ok((
            entry,
            row.get("raw_metadata")?,
            row.get("parsed_metadata")?,
            row.get("error_json")?,
        ))
    }

    fn hydrate_entry(
        (mut entry, raw_json, parsed_json, error_json): (Entry, String, String, Option<String>),
    ) -> RepositoryResult<Entry> {
        entry.raw_metadata = serde_json::from_str(&raw_json)?;
        entry.parsed_metadata = serde_json::from_str(&parsed_json)?;
        entry.error = match error_json {
            Some(json) => Some(serde_json::from_str::<EntryError>(&json)?),
            None => None,
        };
        Ok(entry)
    }

    fn query_entries(
        conn: &Connection,
        sql: &str,
        owner_id: &str,
    ) -> RepositoryResult<Vec<Entry>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![owner_id], Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::hydrate_entry(row?)?);
        }
        Ok(entries)
    }
}

fn parse_object_type(raw: &str) -> ObjectType {
    match raw {
        "Collection" => ObjectType::Collection,
        "FileSet" => ObjectType::FileSet,
        _ => ObjectType::Work,
    }
}

fn parse_entry_status(raw: &str) -> EntryStatus {
    match raw {
        "SUCCEEDED" => EntryStatus::Succeeded,
        "FAILED" => EntryStatus::Failed,
        _ => EntryStatus::Pending,
    }
}

fn parse_run_state(raw: &str) -> RunState {
    match raw {
        "RUNNING" => RunState::Running,
        "COMPLETED" => RunState::Completed,
        "ABORTED" => RunState::Aborted,
        _ => RunState::Pending,
    }
}

#[async_trait]
impl EntryRepository for SqliteEntryRepository {
    async fn create_or_find_entry(&self, entry: Entry) -> RepositoryResult<(Entry, bool)> {
        let conn = self.lock_conn()?;

        // 先查既有条目（幂等重跑复用）
        let existing = conn
            .query_row(
                r#"
                SELECT owner_id, identifier, object_type, run_id, parent_identifier,
                       raw_metadata, parsed_metadata, status, error_json, created_at, updated_at
                FROM entries
                WHERE owner_id = ?1 AND identifier = ?2 AND object_type = ?3
                "#,
                params![entry.owner_id, entry.identifier, entry.object_type.as_str()],
                Self::row_to_entry,
            )
            .optional()?;

        if let Some(found) = existing {
            return Ok((Self::hydrate_entry(found)?, false));
        }

        conn.execute(
            r#"
            INSERT INTO entries (
                owner_id, identifier, object_type, run_id, parent_identifier,
                raw_metadata, parsed_metadata, status, error_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                entry.owner_id,
                entry.identifier,
                entry.object_type.as_str(),
                entry.run_id,
                entry.parent_identifier,
                serde_json::to_string(&entry.raw_metadata)?,
                serde_json::to_string(&entry.parsed_metadata)?,
                entry.status.to_string(),
                entry
                    .error
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                entry.created_at,
                entry.updated_at,
            ],
        )?;

        Ok((entry, true))
    }

    async fn update_entry_status(
        &self,
        owner_id: &str,
        identifier: &str,
        object_type: ObjectType,
        status: EntryStatus,
        error: Option<EntryError>,
    ) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE entries
            SET status = ?1, error_json = ?2, updated_at = ?3
            WHERE owner_id = ?4 AND identifier = ?5 AND object_type = ?6
            "#,
            params![
                status.to_string(),
                error.as_ref().map(serde_json::to_string).transpose()?,
                Utc::now(),
                owner_id,
                identifier,
                object_type.as_str(),
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Entry".to_string(),
                id: format!("{}/{}/{}", owner_id, identifier, object_type),
            });
        }
        Ok(())
    }

    async fn list_entries(&self, owner_id: &str) -> RepositoryResult<Vec<Entry>> {
        let conn = self.lock_conn()?;
        Self::query_entries(
            &conn,
            r#"
            SELECT owner_id, identifier, object_type, run_id, parent_identifier,
                   raw_metadata, parsed_metadata, status, error_json, created_at, updated_at
            FROM entries WHERE owner_id = ?1 ORDER BY id
            "#,
            owner_id,
        )
    }

    async fn find_failed_entries(&self, owner_id: &str) -> RepositoryResult<Vec<Entry>> {
        let conn = self.lock_conn()?;
        Self::query_entries(
            &conn,
            r#"
            SELECT owner_id, identifier, object_type, run_id, parent_identifier,
                   raw_metadata, parsed_metadata, status, error_json, created_at, updated_at
            FROM entries WHERE owner_id = ?1 AND status = 'FAILED' ORDER BY id
            "#,
            owner_id,
        )
    }

    async fn insert_run(&self, run: &Run) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO runs (
                run_id, owner_id, state, total, succeeded_count, failed_count,
                collections_total, fatal_error, started_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                run.run_id,
                run.owner_id,
                run.state.to_string(),
                run.total as i64,
                run.succeeded_count as i64,
                run.failed_count as i64,
                run.collections_total as i64,
                run.fatal_error,
                run.started_at,
                run.finished_at,
            ],
        )?;
        Ok(())
    }

    async fn update_run_summary(&self, run: &Run) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE runs
            SET state = ?1, total = ?2, succeeded_count = ?3, failed_count = ?4,
                collections_total = ?5, fatal_error = ?6, finished_at = ?7
            WHERE run_id = ?8
            "#,
            params![
                run.state.to_string(),
                run.total as i64,
                run.succeeded_count as i64,
                run.failed_count as i64,
                run.collections_total as i64,
                run.fatal_error,
                run.finished_at,
                run.run_id,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Run".to_string(),
                id: run.run_id.clone(),
            });
        }
        Ok(())
    }

    async fn find_run(&self, run_id: &str) -> RepositoryResult<Option<Run>> {
        let conn = self.lock_conn()?;
        let run = conn
            .query_row(
                r#"
                SELECT run_id, owner_id, state, total, succeeded_count, failed_count,
                       collections_total, fatal_error, started_at, finished_at
                FROM runs WHERE run_id = ?1
                "#,
                params![run_id],
                |row| {
                    let state: String = row.get("state")?;
                    Ok(Run {
                        run_id: row.get("run_id")?,
                        owner_id: row.get("owner_id")?,
                        state: parse_run_state(&state),
                        total: row.get::<_, i64>("total")? as usize,
                        succeeded_count: row.get::<_, i64>("succeeded_count")? as usize,
                        failed_count: row.get::<_, i64>("failed_count")? as usize,
                        collections_total: row.get::<_, i64>("collections_total")? as usize,
                        fatal_error: row.get("fatal_error")?,
                        started_at: row.get::<_, DateTime<Utc>>("started_at")?,
                        finished_at: row.get("finished_at")?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_repo() -> (NamedTempFile, SqliteEntryRepository) {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap().to_string();
        let repo = SqliteEntryRepository::new(&path).unwrap();
        (temp, repo)
    }

    #[tokio::test]
    async fn test_create_or_find_reuses_existing() {
        let (_temp, repo) = test_repo();

        let entry = Entry::new("w1", ObjectType::Work, "importer_1", "run-1");
        let (_, created) = repo.create_or_find_entry(entry.clone()).await.unwrap();
        assert!(created);

        let mut again = Entry::new("w1", ObjectType::Work, "importer_1", "run-2");
        again.raw_metadata.insert("title".into(), "changed".into());
        let (found, created) = repo.create_or_find_entry(again).await.unwrap();
        assert!(!created);
        // 复用既有条目,不覆盖
        assert_eq!(found.run_id, "run-1");
    }

    #[tokio::test]
    async fn test_update_status_and_find_failed() {
        let (_temp, repo) = test_repo();

        let mut w = Entry::new("w1", ObjectType::Work, "importer_1", "run-1");
        w.raw_metadata.insert("title".into(), "作品一".into());
        repo.create_or_find_entry(w).await.unwrap();
        repo.create_or_find_entry(Entry::new("c1", ObjectType::Collection, "importer_1", "run-1"))
            .await
            .unwrap();

        repo.update_entry_status(
            "importer_1",
            "w1",
            ObjectType::Work,
            EntryStatus::Failed,
            Some(EntryError::new("EntryCreateError", "对象存储拒绝")),
        )
        .await
        .unwrap();

        let failed = repo.find_failed_entries("importer_1").await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].identifier, "w1");
        assert_eq!(failed[0].error.as_ref().unwrap().kind, "EntryCreateError");
        assert_eq!(failed[0].raw_metadata.get("title").unwrap(), "作品一");
    }

    #[tokio::test]
    async fn test_update_status_missing_entry_is_not_found() {
        let (_temp, repo) = test_repo();
        let result = repo
            .update_entry_status("importer_1", "ghost", ObjectType::Work, EntryStatus::Failed, None)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_run_round_trip() {
        let (_temp, repo) = test_repo();

        let mut run = Run::new("importer_1");
        repo.insert_run(&run).await.unwrap();

        run.state = RunState::Completed;
        run.total = 4;
        run.succeeded_count = 3;
        run.failed_count = 1;
        run.collections_total = 2;
        run.finished_at = Some(Utc::now());
        repo.update_run_summary(&run).await.unwrap();

        let found = repo.find_run(&run.run_id).await.unwrap().unwrap();
        assert_eq!(found.state, RunState::Completed);
        assert_eq!(found.total, 4);
        assert_eq!(found.succeeded_count, 3);
        assert_eq!(found.failed_count, 1);
        assert_eq!(found.collections_total, 2);
    }
}
