// ==========================================
// 加密货币行情数据质量校验系统 - 校验运行记录 Repository 实现
// ==========================================
// 职责: 实现校验运行记录的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::validation_run_repo::{ValidationRunEntity, ValidationRunRepository};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "run_id, source, stage, status, schema_status, total_rows, \
     report_json, stats_json, flagged_file_path, report_file_path, elapsed_ms, created_at";

// ==========================================
// ValidationRunRepositoryImpl
// ==========================================
pub struct ValidationRunRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ValidationRunRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ValidationRunEntity> {
        Ok(ValidationRunEntity {
            run_id: row.get(0)?,
            source: row.get(1)?,
            stage: row.get(2)?,
            status: row.get(3)?,
            schema_status: row.get(4)?,
            total_rows: row.get(5)?,
            report_json: row.get(6)?,
            stats_json: row.get(7)?,
            flagged_file_path: row.get(8)?,
            report_file_path: row.get(9)?,
            elapsed_ms: row.get(10)?,
            created_at: row.get(11)?,
        })
    }
}

#[async_trait]
impl ValidationRunRepository for ValidationRunRepositoryImpl {
    async fn insert_run(&self, run: &ValidationRunEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO validation_run (
                run_id, source, stage, status, schema_status, total_rows,
                report_json, stats_json, flagged_file_path, report_file_path,
                elapsed_ms, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                run.run_id,
                run.source,
                run.stage,
                run.status,
                run.schema_status,
                run.total_rows,
                run.report_json,
                run.stats_json,
                run.flagged_file_path,
                run.report_file_path,
                run.elapsed_ms,
                run.created_at,
            ],
        )?;
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ValidationRunEntity>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM validation_run WHERE run_id = ?1", SELECT_COLUMNS);
        let run = conn
            .query_row(&sql, params![run_id], Self::map_row)
            .optional()?;
        Ok(run)
    }

    async fn list_recent_runs(&self, limit: usize) -> RepositoryResult<Vec<ValidationRunEntity>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM validation_run ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], Self::map_row)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    async fn count_runs_by_status(&self, status: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM validation_run WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn create_repo() -> ValidationRunRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ValidationRunRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn run(run_id: &str, status: &str, created_at: &str) -> ValidationRunEntity {
        ValidationRunEntity {
            run_id: run_id.to_string(),
            source: Some("crypto_raw_2026-01-21.csv".to_string()),
            stage: "data_validation".to_string(),
            status: status.to_string(),
            schema_status: "valid".to_string(),
            total_rows: 4,
            report_json: "{}".to_string(),
            stats_json: None,
            flagged_file_path: None,
            report_file_path: None,
            elapsed_ms: Some(12),
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_run() {
        let repo = create_repo();
        let entity = run("run-1", "passed", "2026-01-21T10:00:00+08:00");
        repo.insert_run(&entity).await.unwrap();

        assert_eq!(repo.get_run("run-1").await.unwrap(), Some(entity));
        assert_eq!(repo.get_run("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_run_id_rejected() {
        let repo = create_repo();
        let entity = run("run-1", "passed", "2026-01-21T10:00:00+08:00");
        repo.insert_run(&entity).await.unwrap();

        let err = repo.insert_run(&entity).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_list_recent_and_count() {
        let repo = create_repo();
        repo.insert_run(&run("run-1", "passed", "2026-01-20T10:00:00+08:00"))
            .await
            .unwrap();
        repo.insert_run(&run("run-2", "failed", "2026-01-21T10:00:00+08:00"))
            .await
            .unwrap();

        let recent = repo.list_recent_runs(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].run_id, "run-2");
        assert_eq!(repo.count_runs_by_status("failed").await.unwrap(), 1);
    }
}
