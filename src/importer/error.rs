// ==========================================
// 加密货币行情数据质量校验系统 - 数据源错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 数据源故障只以错误返回，永不伪装成批次
// ==========================================

use thiserror::Error;

/// 数据源错误类型
#[derive(Error, Debug)]
pub enum FeedError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls/.json）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 上游接口错误 =====
    #[error("上游载荷格式错误: {0}")]
    MalformedPayload(String),

    #[error("请求超时 ({timeout_secs}s)")]
    Timeout { timeout_secs: u64 },

    #[error("请求被限流，{retry_after_secs}s 后重试")]
    RateLimited { retry_after_secs: u64 },

    #[error("网络传输失败: {0}")]
    Transport(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FeedError {
    /// 调度器可据此决定是否重试（引擎本身不重试）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedError::Timeout { .. } | FeedError::RateLimited { .. } | FeedError::Transport(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for FeedError {
    fn from(err: csv::Error) -> Self {
        FeedError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for FeedError {
    fn from(err: calamine::Error) -> Self {
        FeedError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type FeedResult<T> = Result<T, FeedError>;
