// ==========================================
// 加密货币行情数据质量校验系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 校验运行记录落库 + 快照文件导出
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod snapshot_exporter;
pub mod validation_run_repo;
pub mod validation_run_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use snapshot_exporter::SnapshotExporter;
pub use validation_run_repo::{ValidationRunEntity, ValidationRunRepository};
pub use validation_run_repo_impl::ValidationRunRepositoryImpl;
