// ==========================================
// 加密货币行情数据质量校验系统 - 校验运行记录 Repository Trait
// ==========================================
// 职责: 定义校验运行记录的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// ValidationRunEntity - 校验运行记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRunEntity {
    pub run_id: String,
    pub source: Option<String>,
    pub stage: String,         // data_validation / schema_validation
    pub status: String,        // passed / failed
    pub schema_status: String, // valid / empty_data / ...
    pub total_rows: i64,
    pub report_json: String,
    pub stats_json: Option<String>,
    pub flagged_file_path: Option<String>,
    pub report_file_path: Option<String>,
    pub elapsed_ms: Option<i64>,
    pub created_at: String,
}

// ==========================================
// ValidationRunRepository Trait
// ==========================================
// 实现者: ValidationRunRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ValidationRunRepository: Send + Sync {
    /// 写入一次校验运行记录
    ///
    /// # 错误
    /// - UniqueConstraintViolation: run_id 重复
    async fn insert_run(&self, run: &ValidationRunEntity) -> RepositoryResult<()>;

    /// 按 run_id 查询
    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ValidationRunEntity>>;

    /// 最近的运行记录（created_at 倒序）
    async fn list_recent_runs(&self, limit: usize) -> RepositoryResult<Vec<ValidationRunEntity>>;

    /// 按状态计数
    async fn count_runs_by_status(&self, status: &str) -> RepositoryResult<usize>;
}
