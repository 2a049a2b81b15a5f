// ==========================================
// 加密货币行情数据质量校验系统 - 引擎层
// ==========================================
// 职责: 结构闸门、质量规则、报告构建、两态编排
// 红线: 引擎不做 IO，不拼 SQL；规则永不因输入畸形而失败
// ==========================================

pub mod error;
pub mod numeric;
pub mod orchestrator;
pub mod report_builder;
pub mod rule_engine;
pub mod rules;
pub mod schema_gate;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use numeric::try_parse_number;
pub use orchestrator::{GateDecision, PipelineOutcome, ValidationOrchestrator};
pub use report_builder::{collect_stats, failed_percentage, schema_error_message, ReportBuilder};
pub use rule_engine::{MetadataStamp, RuleEngine, RuleRunSummary};
pub use rules::{
    DuplicateRule, FlagRule, MarketCapConsistencyRule, MissingValuesRule, NumericTypeRule,
    PriceRangeRule,
};
pub use schema_gate::{validate_schema, BatchInput, SchemaGate};
