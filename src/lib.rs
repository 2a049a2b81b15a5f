// ==========================================
// 加密货币行情数据质量校验系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 行情批次的结构闸门 + 逐行质量规则 + 机器可读报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录、批次与报告
pub mod domain;

// 数据仓储层 - 运行记录与快照导出
pub mod repository;

// 引擎层 - 结构闸门、质量规则、报告构建
pub mod engine;

// 数据源层 - 外部行情数据
pub mod importer;

// 配置层 - 校验阈值
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 校验运行接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{QualityRule, RuleOutcome, SchemaValidationStatus, ValidationStatus};

// 领域实体
pub use domain::{
    CellValue, MarketRecord, QualityReport, RecordBatch, SchemaErrorReport, ValidationReport,
    ValidationStats,
};

// 引擎
pub use engine::{
    validate_schema, BatchInput, ReportBuilder, RuleEngine, SchemaGate, ValidationOrchestrator,
};

// 配置
pub use config::ValidationConfig;

// API
pub use api::{ApiError, ValidationApi, ValidationRunResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "加密货币行情数据质量校验系统";
