// ==========================================
// 加密货币行情数据质量校验系统 - 运行结果通知
// ==========================================
// 职责: 校验运行结束后的通知出口
// 默认实现: LogNotifier（只写日志；外部投递通道不在本系统内）
// ==========================================

use crate::api::error::ApiResult;
use crate::api::validation_api::ValidationRunResult;
use crate::domain::report::QualityReport;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, warn};

// ==========================================
// ReportNotifier Trait
// ==========================================
#[async_trait]
pub trait ReportNotifier: Send + Sync {
    async fn notify(&self, result: &ValidationRunResult) -> ApiResult<()>;
}

/// 通知摘要
///
/// # 结构
/// - 校验报告: status / execution_date / report_file_path / data_quality / validation_summary
/// - 结构错误: status / execution_date / error_report_file_path / schema_status / error_message
pub fn notification_summary(result: &ValidationRunResult) -> Value {
    match &result.report {
        QualityReport::Validation(report) => json!({
            "run_id": result.run_id,
            "status": report.status,
            "execution_date": result.execution_date.to_string(),
            "report_file_path": result.report_file_path,
            "data_quality": result.stats,
            "validation_summary": report.summary,
        }),
        QualityReport::SchemaError(report) => json!({
            "run_id": result.run_id,
            "status": report.status,
            "execution_date": result.execution_date.to_string(),
            "error_report_file_path": result.report_file_path,
            "schema_status": report.error,
            "error_message": report.error_message,
        }),
    }
}

// ==========================================
// LogNotifier - 日志通知
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ReportNotifier for LogNotifier {
    async fn notify(&self, result: &ValidationRunResult) -> ApiResult<()> {
        let summary = notification_summary(result);
        let rendered = serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string());

        match &result.report {
            QualityReport::SchemaError(_) => {
                error!(run_id = %result.run_id, "结构校验失败摘要: {}", rendered);
            }
            QualityReport::Validation(report) if report.is_failed() => {
                warn!(run_id = %result.run_id, "校验完成，存在数据质量问题: {}", rendered);
            }
            QualityReport::Validation(_) => {
                info!(run_id = %result.run_id, "校验完成，全部通过: {}", rendered);
            }
        }
        Ok(())
    }
}
