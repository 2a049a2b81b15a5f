// ==========================================
// 加密货币行情数据质量校验系统 - 领域模型层
// ==========================================
// 职责: 字段词表、记录批次、状态类型、报告结构
// 红线: 不含数据访问逻辑，不含规则逻辑
// ==========================================

pub mod fields;
pub mod record;
pub mod report;
pub mod types;

// 重导出核心类型
pub use record::{CellValue, MarketRecord, RecordBatch};
pub use report::{
    QualityReport, SchemaErrorReport, SchemaErrorSummary, ValidationItemReport,
    ValidationReport, ValidationStats, ValidationSummary,
};
pub use types::{QualityRule, RuleOutcome, SchemaValidationStatus, ValidationStatus};
