// ==========================================
// 加密货币行情数据质量校验系统 - 校验编排器
// ==========================================
// 用途: 协调结构闸门、规则引擎、报告构建器的执行顺序
// 流程（显式两态分派）:
//   SCHEMA_OK   → 规则引擎 → 校验报告
//   SCHEMA_FAIL → 结构错误报告（不执行任何规则）
// ==========================================

use crate::config::validation_config::ValidationConfig;
use crate::domain::record::RecordBatch;
use crate::domain::report::{QualityReport, ValidationStats};
use crate::domain::types::SchemaValidationStatus;
use crate::engine::error::EngineResult;
use crate::engine::report_builder::{collect_stats, ReportBuilder};
use crate::engine::rule_engine::{RuleEngine, RuleRunSummary};
use crate::engine::schema_gate::{BatchInput, SchemaGate};
use serde_json::Value;
use tracing::{info, instrument, warn};

// ==========================================
// GateDecision - 闸门分派结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    SchemaOk,
    SchemaFail(SchemaValidationStatus),
}

impl From<SchemaValidationStatus> for GateDecision {
    fn from(status: SchemaValidationStatus) -> Self {
        if status.is_valid() {
            GateDecision::SchemaOk
        } else {
            GateDecision::SchemaFail(status)
        }
    }
}

// ==========================================
// PipelineOutcome - 单次校验结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub schema_status: SchemaValidationStatus,
    pub report: QualityReport,
    /// 已标记批次（结构校验失败且上游未提供表格时为 None）
    pub batch: Option<RecordBatch>,
    pub rule_summary: Option<RuleRunSummary>,
    pub stats: Option<ValidationStats>,
}

impl PipelineOutcome {
    pub fn is_failed(&self) -> bool {
        self.report.is_failed()
    }
}

// ==========================================
// ValidationOrchestrator - 校验编排器
// ==========================================
pub struct ValidationOrchestrator {
    gate: SchemaGate,
    engine: RuleEngine,
    builder: ReportBuilder,
}

impl ValidationOrchestrator {
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_engine(RuleEngine::new(config))
    }

    /// 使用自定义规则引擎（例如只启用部分规则）
    pub fn with_engine(engine: RuleEngine) -> Self {
        let config = engine.config();
        Self {
            gate: SchemaGate::new(config.required_fields.clone()),
            builder: ReportBuilder::new(config),
            engine,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        self.engine.config()
    }

    /// 对已类型化批次执行完整校验
    ///
    /// # 参数
    /// - batch: None 表示上游没有提供批次（按 EMPTY_DATA 处理）
    #[instrument(skip_all, fields(rows = batch.as_ref().map(RecordBatch::len)))]
    pub fn run_batch(&self, batch: Option<RecordBatch>) -> EngineResult<PipelineOutcome> {
        let status = self.gate.validate_schema(batch.as_ref().map(BatchInput::Table));
        match GateDecision::from(status) {
            GateDecision::SchemaOk => match batch {
                Some(batch) => self.run_rules(batch),
                None => Ok(self.schema_failure(SchemaValidationStatus::EmptyData, None)),
            },
            GateDecision::SchemaFail(status) => Ok(self.schema_failure(status, batch)),
        }
    }

    /// 对上游原始 JSON 载荷执行完整校验
    #[instrument(skip_all)]
    pub fn run_json(&self, payload: Option<&Value>) -> EngineResult<PipelineOutcome> {
        let status = self.gate.validate_schema(payload.map(BatchInput::Json));
        let batch = payload.and_then(RecordBatch::from_json);
        match (GateDecision::from(status), batch) {
            (GateDecision::SchemaOk, Some(batch)) => self.run_rules(batch),
            (GateDecision::SchemaOk, None) => {
                Ok(self.schema_failure(SchemaValidationStatus::InvalidType, None))
            }
            (GateDecision::SchemaFail(status), batch) => Ok(self.schema_failure(status, batch)),
        }
    }

    /// 对已标记快照只生成报告（不重新执行规则）
    ///
    /// 快照中缺失的标记列在报告中为 skipped
    #[instrument(skip_all, fields(rows = batch.as_ref().map(RecordBatch::len)))]
    pub fn report_flagged(&self, batch: Option<RecordBatch>) -> EngineResult<PipelineOutcome> {
        let status = self.gate.validate_schema(batch.as_ref().map(BatchInput::Table));
        match (GateDecision::from(status), batch) {
            (GateDecision::SchemaOk, Some(batch)) => {
                let report = self.builder.generate_validation_report(&batch)?;
                let stats = collect_stats(&batch);
                info!(
                    status = %report.status,
                    skipped = ?report.summary.skipped,
                    "已标记快照报告生成完成"
                );
                Ok(PipelineOutcome {
                    schema_status: SchemaValidationStatus::Valid,
                    report: QualityReport::Validation(report),
                    batch: Some(batch),
                    rule_summary: None,
                    stats: Some(stats),
                })
            }
            (GateDecision::SchemaOk, None) => {
                Ok(self.schema_failure(SchemaValidationStatus::EmptyData, None))
            }
            (GateDecision::SchemaFail(status), batch) => Ok(self.schema_failure(status, batch)),
        }
    }

    fn run_rules(&self, mut batch: RecordBatch) -> EngineResult<PipelineOutcome> {
        let rule_summary = self.engine.apply(&mut batch);
        let report = self.builder.generate_validation_report(&batch)?;
        let stats = collect_stats(&batch);

        info!(
            status = %report.status,
            total_rows = report.total_rows,
            passed = ?report.summary.passed,
            failed = ?report.summary.failed,
            "数据质量校验完成"
        );

        Ok(PipelineOutcome {
            schema_status: SchemaValidationStatus::Valid,
            report: QualityReport::Validation(report),
            batch: Some(batch),
            rule_summary: Some(rule_summary),
            stats: Some(stats),
        })
    }

    fn schema_failure(
        &self,
        status: SchemaValidationStatus,
        batch: Option<RecordBatch>,
    ) -> PipelineOutcome {
        let report = self.builder.generate_schema_error_report(status);
        warn!(error = %status, message = %report.error_message, "结构校验失败，跳过规则校验");

        PipelineOutcome {
            schema_status: status,
            report: QualityReport::SchemaError(report),
            batch,
            rule_summary: None,
            stats: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::MarketRecord;
    use crate::domain::types::{QualityRule, ValidationStatus};
    use serde_json::json;

    fn coin(id: &str, price: f64) -> MarketRecord {
        MarketRecord::new()
            .with("id", id)
            .with("symbol", id)
            .with("name", id)
            .with("current_price", price)
            .with("market_cap", price * 100.0)
            .with("total_volume", 10.0)
            .with("circulating_supply", 100.0)
    }

    #[test]
    fn test_absent_batch_goes_to_schema_error() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());
        let outcome = orchestrator.run_batch(None).unwrap();

        assert_eq!(outcome.schema_status, SchemaValidationStatus::EmptyData);
        assert_eq!(outcome.report.stage(), "schema_validation");
        assert!(outcome.is_failed());
        assert!(outcome.rule_summary.is_none());
    }

    #[test]
    fn test_missing_columns_never_run_rules() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());
        let batch = RecordBatch::from_records(vec![MarketRecord::new().with("id", "a")]);
        let outcome = orchestrator.run_batch(Some(batch)).unwrap();

        assert_eq!(
            outcome.schema_status,
            SchemaValidationStatus::MissingRequiredFields
        );
        let batch = outcome.batch.unwrap();
        assert!(batch.flags(QualityRule::Duplicates).is_none());
        assert!(batch.validated_at().is_none());
    }

    #[test]
    fn test_clean_batch_passes() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());
        let batch = RecordBatch::from_records(vec![coin("a", 1.0), coin("b", 2.0)]);
        let outcome = orchestrator.run_batch(Some(batch)).unwrap();

        assert_eq!(outcome.report.status(), ValidationStatus::Passed);
        assert_eq!(outcome.report.stage(), "data_validation");
        assert_eq!(outcome.stats.unwrap().total_rows, 2);
        assert!(outcome.batch.unwrap().validated_at().is_some());
    }

    #[test]
    fn test_report_flagged_does_not_rerun_rules() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());
        let mut batch = RecordBatch::from_records(vec![coin("a", 1.0), coin("a", 2.0)]);
        batch.set_flags(QualityRule::Duplicates, vec![false, true]);

        let outcome = orchestrator.report_flagged(Some(batch)).unwrap();

        let QualityReport::Validation(report) = outcome.report else {
            panic!("expected validation report");
        };
        assert_eq!(report.summary.failed, vec!["duplicates"]);
        assert_eq!(report.summary.skipped.len(), 4);
        assert!(outcome.rule_summary.is_none());
    }

    #[test]
    fn test_json_payload_dispatch() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());

        let invalid = json!({"data": []});
        let outcome = orchestrator.run_json(Some(&invalid)).unwrap();
        assert_eq!(outcome.schema_status, SchemaValidationStatus::InvalidType);
        assert!(outcome.batch.is_none());

        let valid = json!([{
            "id": "a", "symbol": "a", "name": "A",
            "current_price": 1.0, "market_cap": 100.0,
            "total_volume": 1.0, "circulating_supply": 100.0
        }]);
        let outcome = orchestrator.run_json(Some(&valid)).unwrap();
        assert_eq!(outcome.report.status(), ValidationStatus::Passed);
    }

    #[test]
    fn test_null_json_payload_is_empty_data() {
        let orchestrator = ValidationOrchestrator::new(ValidationConfig::default());
        let outcome = orchestrator.run_json(Some(&Value::Null)).unwrap();

        assert_eq!(outcome.schema_status, SchemaValidationStatus::EmptyData);
        let QualityReport::SchemaError(report) = outcome.report else {
            panic!("expected schema error report");
        };
        assert_eq!(report.error_message, "Batch is empty or unavailable");
        assert!(outcome.rule_summary.is_none());
    }
}
