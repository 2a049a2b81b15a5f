// ==========================================
// 加密货币行情数据质量校验系统 - 质量报告模型
// ==========================================
// 职责: 校验报告 / 结构错误报告（构建后不可变，供下游分支、持久化、通知使用）
// ==========================================

use crate::domain::types::{SchemaValidationStatus, ValidationStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 报告阶段: 规则校验
pub const STAGE_DATA_VALIDATION: &str = "data_validation";

/// 报告阶段: 结构校验
pub const STAGE_SCHEMA_VALIDATION: &str = "schema_validation";

/// 跳过原因: 规则未执行
pub const REASON_VALIDATION_NOT_RUN: &str = "validation_not_run";

// ==========================================
// ValidationItemReport - 单条规则报告
// ==========================================
// SKIPPED → {status, reason}
// PASSED  → {status, total_rows, failed_count: 0}
// FAILED  → {status, total_rows, failed_count, failed_percentage, examples}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationItemReport {
    pub status: ValidationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationItemReport {
    pub fn skipped() -> Self {
        Self {
            status: ValidationStatus::Skipped,
            total_rows: None,
            failed_count: None,
            failed_percentage: None,
            examples: None,
            reason: Some(REASON_VALIDATION_NOT_RUN.to_string()),
        }
    }

    pub fn passed(total_rows: usize) -> Self {
        Self {
            status: ValidationStatus::Passed,
            total_rows: Some(total_rows),
            failed_count: Some(0),
            failed_percentage: None,
            examples: None,
            reason: None,
        }
    }

    pub fn failed(
        total_rows: usize,
        failed_count: usize,
        failed_percentage: f64,
        examples: Vec<Map<String, Value>>,
    ) -> Self {
        Self {
            status: ValidationStatus::Failed,
            total_rows: Some(total_rows),
            failed_count: Some(failed_count),
            failed_percentage: Some(failed_percentage),
            examples: Some(examples),
            reason: None,
        }
    }
}

// ==========================================
// ValidationSummary - 校验汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub executed: usize,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

// ==========================================
// ValidationReport - 完整校验报告
// ==========================================
// validations 以规则名为键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub stage: String,
    pub total_rows: usize,
    pub validations: BTreeMap<String, ValidationItemReport>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}

// ==========================================
// SchemaErrorReport - 结构错误报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaErrorSummary {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaErrorReport {
    pub status: ValidationStatus,
    pub stage: String,
    pub error: SchemaValidationStatus,
    pub error_message: String,
    pub validations: BTreeMap<String, Value>,
    pub summary: SchemaErrorSummary,
}

// ==========================================
// QualityReport - 下游分支使用的报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QualityReport {
    Validation(ValidationReport),
    SchemaError(SchemaErrorReport),
}

impl QualityReport {
    pub fn status(&self) -> ValidationStatus {
        match self {
            QualityReport::Validation(report) => report.status,
            QualityReport::SchemaError(report) => report.status,
        }
    }

    pub fn stage(&self) -> &str {
        match self {
            QualityReport::Validation(report) => &report.stage,
            QualityReport::SchemaError(report) => &report.stage,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status() == ValidationStatus::Failed
    }
}

// ==========================================
// ValidationStats - 单次运行的标记统计
// ==========================================
// 规则未执行时计为 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_rows: usize,
    pub invalid_types: usize,
    pub invalid_prices: usize,
    pub invalid_market_cap: usize,
    pub missing_values: usize,
    pub duplicates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_report_shapes() {
        let skipped = serde_json::to_value(ValidationItemReport::skipped()).unwrap();
        assert_eq!(skipped, json!({"status": "skipped", "reason": "validation_not_run"}));

        let passed = serde_json::to_value(ValidationItemReport::passed(3)).unwrap();
        assert_eq!(passed, json!({"status": "passed", "total_rows": 3, "failed_count": 0}));

        let failed = serde_json::to_value(ValidationItemReport::failed(3, 1, 33.33, vec![])).unwrap();
        assert_eq!(
            failed,
            json!({
                "status": "failed",
                "total_rows": 3,
                "failed_count": 1,
                "failed_percentage": 33.33,
                "examples": []
            })
        );
    }
}
