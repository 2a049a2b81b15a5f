// ==========================================
// 加密货币行情数据质量校验系统 - API 层
// ==========================================
// 职责: 提供校验运行接口，供命令行与调度方调用
// ==========================================

pub mod error;
pub mod notifier;
pub mod validation_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use notifier::{notification_summary, LogNotifier, ReportNotifier};
pub use validation_api::{ValidationApi, ValidationRunResult};
