// ==========================================
// 加密货币行情数据质量校验系统 - 报告构建器
// ==========================================
// 职责: 已标记批次 → 校验报告；结构校验失败码 → 结构错误报告
// 红线:
// - 报告只读批次，不修改标记
// - 规则未执行（侧表中无标记列）→ skipped，不计入 executed
// - 任一规则 failed → 整体 failed
// ==========================================

use crate::config::validation_config::ValidationConfig;
use crate::domain::fields::DEFAULT_EXAMPLE_LIMIT;
use crate::domain::record::RecordBatch;
use crate::domain::report::{
    SchemaErrorReport, SchemaErrorSummary, ValidationItemReport, ValidationReport,
    ValidationStats, ValidationSummary, STAGE_DATA_VALIDATION, STAGE_SCHEMA_VALIDATION,
};
use crate::domain::types::{QualityRule, RuleOutcome, SchemaValidationStatus, ValidationStatus};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::schema_gate::SchemaGate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// 结构错误码对应的说明文字
pub fn schema_error_message(status: SchemaValidationStatus) -> &'static str {
    match status {
        SchemaValidationStatus::EmptyData => "Batch is empty or unavailable",
        SchemaValidationStatus::InvalidType => "Input is not a valid record table",
        SchemaValidationStatus::MissingRequiredFields => "Missing required fields",
        SchemaValidationStatus::Valid => "Unknown schema error",
    }
}

/// 失败占比（百分比，保留两位小数）
pub fn failed_percentage(failed_count: usize, total_rows: usize) -> f64 {
    if total_rows == 0 {
        return 0.0;
    }
    let pct = failed_count as f64 / total_rows as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

// ==========================================
// ReportBuilder - 报告构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    gate: SchemaGate,
    example_limit: usize,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            gate: SchemaGate::default(),
            example_limit: DEFAULT_EXAMPLE_LIMIT,
        }
    }
}

impl ReportBuilder {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            gate: SchemaGate::new(config.required_fields.clone()),
            example_limit: config.example_limit,
        }
    }

    /// 生成校验报告
    ///
    /// # 错误
    /// - EngineError::UngatedBatch: 批次本不能通过结构闸门
    pub fn generate_validation_report(&self, batch: &RecordBatch) -> EngineResult<ValidationReport> {
        let schema_status = self.gate.validate_table(batch);
        if !schema_status.is_valid() {
            return Err(EngineError::UngatedBatch {
                status: schema_status,
            });
        }

        let total_rows = batch.len();
        let mut validations = BTreeMap::new();
        let mut summary = ValidationSummary {
            total: QualityRule::ALL.len(),
            ..ValidationSummary::default()
        };

        for rule in QualityRule::ALL {
            let outcome = batch.rule_outcome(rule);
            let item = match outcome {
                RuleOutcome::NotRun => ValidationItemReport::skipped(),
                RuleOutcome::Passed => ValidationItemReport::passed(total_rows),
                RuleOutcome::Failed(failed_count) => ValidationItemReport::failed(
                    total_rows,
                    failed_count,
                    failed_percentage(failed_count, total_rows),
                    self.collect_examples(batch, rule),
                ),
            };

            let name = rule.rule_name().to_string();
            match item.status {
                ValidationStatus::Passed => {
                    summary.executed += 1;
                    summary.passed.push(name.clone());
                }
                ValidationStatus::Failed => {
                    summary.executed += 1;
                    summary.failed.push(name.clone());
                }
                ValidationStatus::Skipped => summary.skipped.push(name.clone()),
            }
            validations.insert(name, item);
        }

        let status = if summary.failed.is_empty() {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };

        debug!(
            status = %status,
            executed = summary.executed,
            failed = summary.failed.len(),
            "校验报告生成完成"
        );

        Ok(ValidationReport {
            status,
            stage: STAGE_DATA_VALIDATION.to_string(),
            total_rows,
            validations,
            summary,
        })
    }

    /// 生成结构错误报告（状态恒为 failed）
    pub fn generate_schema_error_report(&self, status: SchemaValidationStatus) -> SchemaErrorReport {
        SchemaErrorReport {
            status: ValidationStatus::Failed,
            stage: STAGE_SCHEMA_VALIDATION.to_string(),
            error: status,
            error_message: schema_error_message(status).to_string(),
            validations: BTreeMap::new(),
            summary: SchemaErrorSummary {
                passed: Vec::new(),
                failed: vec![STAGE_SCHEMA_VALIDATION.to_string()],
            },
        }
    }

    /// 失败样例: 按原始顺序取前 N 条被标记的记录，投影到规则的样例列
    fn collect_examples(&self, batch: &RecordBatch, rule: QualityRule) -> Vec<Map<String, Value>> {
        let Some(flags) = batch.flags(rule) else {
            return Vec::new();
        };

        batch
            .records()
            .iter()
            .zip(flags)
            .filter(|(_, flagged)| **flagged)
            .take(self.example_limit)
            .map(|(record, _)| {
                rule.example_columns()
                    .iter()
                    .map(|column| (column.to_string(), record.get(column).to_json()))
                    .collect()
            })
            .collect()
    }
}

/// 单次运行的标记统计（规则未执行计为 0）
pub fn collect_stats(batch: &RecordBatch) -> ValidationStats {
    let count = |rule| batch.failed_count(rule).unwrap_or(0);
    ValidationStats {
        total_rows: batch.len(),
        invalid_types: count(QualityRule::NumericTypes),
        invalid_prices: count(QualityRule::PriceRange),
        invalid_market_cap: count(QualityRule::MarketCap),
        missing_values: count(QualityRule::MissingValues),
        duplicates: count(QualityRule::Duplicates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::REQUIRED_FIELDS;
    use crate::domain::record::MarketRecord;
    use serde_json::json;

    fn gated_batch(ids: &[&str]) -> RecordBatch {
        RecordBatch::from_records(
            ids.iter()
                .map(|id| {
                    REQUIRED_FIELDS
                        .iter()
                        .fold(MarketRecord::new(), |record, field| record.with(field, 1.0))
                        .with("id", *id)
                        .with("symbol", id.to_lowercase().as_str())
                        .with("name", *id)
                })
                .collect(),
        )
    }

    #[test]
    fn test_failed_percentage_rounding() {
        assert_eq!(failed_percentage(1, 3), 33.33);
        assert_eq!(failed_percentage(2, 3), 66.67);
        assert_eq!(failed_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_never_run_rules_are_skipped() {
        let batch = gated_batch(&["A", "B"]);
        let report = ReportBuilder::default()
            .generate_validation_report(&batch)
            .unwrap();

        assert_eq!(report.status, ValidationStatus::Passed);
        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.executed, 0);
        assert_eq!(report.summary.skipped.len(), 5);
        assert_eq!(
            serde_json::to_value(&report.validations["duplicates"]).unwrap(),
            json!({"status": "skipped", "reason": "validation_not_run"})
        );
    }

    #[test]
    fn test_any_failure_fails_report() {
        let mut batch = gated_batch(&["A", "A", "B"]);
        batch.set_flags(QualityRule::Duplicates, vec![false, true, false]);
        batch.set_flags(QualityRule::PriceRange, vec![false, false, false]);

        let report = ReportBuilder::default()
            .generate_validation_report(&batch)
            .unwrap();

        assert!(report.is_failed());
        assert_eq!(report.summary.executed, 2);
        assert_eq!(report.summary.passed, vec!["price_range"]);
        assert_eq!(report.summary.failed, vec!["duplicates"]);

        let duplicates = &report.validations["duplicates"];
        assert_eq!(duplicates.failed_count, Some(1));
        assert_eq!(duplicates.failed_percentage, Some(33.33));
        assert_eq!(
            duplicates.examples.as_ref().unwrap()[0],
            json!({"id": "A", "symbol": "a", "name": "A"})
                .as_object()
                .unwrap()
                .clone()
        );
    }

    #[test]
    fn test_examples_are_capped() {
        let ids: Vec<String> = (0..8).map(|i| format!("coin{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut batch = gated_batch(&id_refs);
        batch.set_flags(QualityRule::MissingValues, vec![true; 8]);

        let report = ReportBuilder::default()
            .generate_validation_report(&batch)
            .unwrap();
        let examples = report.validations["missing_values"].examples.as_ref().unwrap();
        assert_eq!(examples.len(), 5);
        assert_eq!(examples[0]["symbol"], json!("coin0"));
        assert_eq!(examples[4]["symbol"], json!("coin4"));
    }

    #[test]
    fn test_ungated_batch_is_rejected() {
        let batch = RecordBatch::from_records(vec![MarketRecord::new().with("id", "a")]);
        let err = ReportBuilder::default()
            .generate_validation_report(&batch)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::UngatedBatch {
                status: SchemaValidationStatus::MissingRequiredFields
            }
        ));

        let empty = RecordBatch::new();
        assert!(ReportBuilder::default().generate_validation_report(&empty).is_err());
    }

    #[test]
    fn test_schema_error_report_shape() {
        let report =
            ReportBuilder::default().generate_schema_error_report(SchemaValidationStatus::EmptyData);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "failed",
                "stage": "schema_validation",
                "error": "empty_data",
                "error_message": "Batch is empty or unavailable",
                "validations": {},
                "summary": {"passed": [], "failed": ["schema_validation"]}
            })
        );

        let unknown =
            ReportBuilder::default().generate_schema_error_report(SchemaValidationStatus::Valid);
        assert_eq!(unknown.error_message, "Unknown schema error");
    }

    #[test]
    fn test_collect_stats() {
        let mut batch = gated_batch(&["A", "A"]);
        batch.set_flags(QualityRule::Duplicates, vec![false, true]);
        let stats = collect_stats(&batch);
        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.invalid_prices, 0);
    }
}
