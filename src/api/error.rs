// ==========================================
// 加密货币行情数据质量校验系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把下层错误转换为调用方可读的错误消息
// 红线: 数据源错误原样保留为 Feed 变体，不转换为校验结果
// ==========================================

use crate::config::validation_config_trait::ConfigReadError;
use crate::engine::error::EngineError;
use crate::importer::error::FeedError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 数据源错误
    // ==========================================
    #[error("数据源获取失败: {0}")]
    Feed(#[from] FeedError),

    // ==========================================
    // 引擎错误
    // ==========================================
    #[error("校验引擎调用错误: {0}")]
    Engine(#[from] EngineError),

    // ==========================================
    // 输入与配置错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("快照导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FileWriteError { path, message } => {
                ApiError::ExportError(format!("{}: {}", path, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从配置读取错误转换
// ==========================================
impl From<ConfigReadError> for ApiError {
    fn from(err: ConfigReadError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SchemaValidationStatus;

    #[test]
    fn test_feed_error_is_kept() {
        let err: ApiError = FeedError::RateLimited { retry_after_secs: 30 }.into();
        assert!(matches!(
            err,
            ApiError::Feed(FeedError::RateLimited { retry_after_secs: 30 })
        ));
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "ValidationRun".to_string(),
            id: "run-1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "资源未找到: ValidationRun(id=run-1)不存在");
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ApiError = EngineError::UngatedBatch {
            status: SchemaValidationStatus::EmptyData,
        }
        .into();
        assert!(matches!(err, ApiError::Engine(_)));
    }
}
