// ==========================================
// 加密货币行情数据质量校验系统 - 校验 API
// ==========================================
// 职责: 封装一次完整的校验运行
// 流程: 拉取 → 结构闸门 → 规则 → 报告 → 导出快照 → 落库 → 通知
// 红线:
// - 数据源错误直接返回 ApiError::Feed，不生成报告
// - 只生成报告模式不执行规则；JSON 载荷无法承载标记列，直接拒绝
// - 不重试（重试策略属于调度方）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::notifier::{LogNotifier, ReportNotifier};
use crate::config::validation_config::ValidationConfig;
use crate::config::validation_config_trait::ValidationConfigReader;
use crate::config::ConfigManager;
use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::report::{QualityReport, ValidationStats};
use crate::domain::types::SchemaValidationStatus;
use crate::engine::orchestrator::{PipelineOutcome, ValidationOrchestrator};
use crate::importer::market_source::{FeedPayload, FileMarketSource, MarketDataSource};
use crate::repository::{
    SnapshotExporter, ValidationRunEntity, ValidationRunRepository, ValidationRunRepositoryImpl,
};
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

// ==========================================
// ValidationRunResult - 单次运行结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRunResult {
    pub run_id: String,
    pub source: String,
    pub execution_date: NaiveDate,
    pub schema_status: SchemaValidationStatus,
    pub report: QualityReport,
    pub stats: Option<ValidationStats>,
    pub raw_file_path: Option<String>,
    pub flagged_file_path: Option<String>,
    pub report_file_path: Option<String>,
    pub elapsed_ms: i64,
}

impl ValidationRunResult {
    pub fn is_failed(&self) -> bool {
        self.report.is_failed()
    }
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// 执行全部规则
    FullValidation,
    /// 读取已标记快照，只生成报告
    ReportOnly,
}

// ==========================================
// ValidationApi - 校验 API
// ==========================================
pub struct ValidationApi {
    orchestrator: Arc<ValidationOrchestrator>,
    run_repo: Option<Arc<dyn ValidationRunRepository>>,
    exporter: Option<SnapshotExporter>,
    notifier: Arc<dyn ReportNotifier>,
}

impl ValidationApi {
    /// 仅内存运行（不导出、不落库，通知写日志）
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            orchestrator: Arc::new(ValidationOrchestrator::new(config)),
            run_repo: None,
            exporter: None,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// 基于数据库路径创建（读取配置覆写项、落库运行记录）
    ///
    /// # 参数
    /// - db_path: SQLite 文件路径
    /// - out_dir: 快照导出根目录（None 表示不导出）
    pub async fn from_db_path(db_path: &str, out_dir: Option<PathBuf>) -> ApiResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        configure_sqlite_connection(&conn)
            .and_then(|_| init_schema(&conn))
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = ConfigManager::from_connection(conn.clone());
        let config = config_manager.load_validation_config().await?;
        info!(db_path = %db_path, config = ?config, "校验配置加载完成");

        let mut api = Self::new(config)
            .with_repository(Arc::new(ValidationRunRepositoryImpl::from_connection(conn)));
        if let Some(out_dir) = out_dir {
            api = api.with_exporter(SnapshotExporter::new(out_dir));
        }
        Ok(api)
    }

    pub fn with_orchestrator(mut self, orchestrator: ValidationOrchestrator) -> Self {
        self.orchestrator = Arc::new(orchestrator);
        self
    }

    pub fn with_repository(mut self, run_repo: Arc<dyn ValidationRunRepository>) -> Self {
        self.run_repo = Some(run_repo);
        self
    }

    pub fn with_exporter(mut self, exporter: SnapshotExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReportNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        self.orchestrator.config()
    }

    // ==========================================
    // 校验入口
    // ==========================================

    /// 从任意数据源执行完整校验
    pub async fn validate_source(&self, source: &dyn MarketDataSource) -> ApiResult<ValidationRunResult> {
        self.execute(source, RunMode::FullValidation).await
    }

    /// 校验单个快照文件（CSV / Excel / JSON）
    pub async fn validate_file<P: AsRef<Path>>(&self, path: P) -> ApiResult<ValidationRunResult> {
        let source = FileMarketSource::new(path);
        self.execute(&source, RunMode::FullValidation).await
    }

    /// 从已标记快照重建报告（不重新执行规则）
    ///
    /// # 错误
    /// - ApiError::InvalidInput: 快照是 JSON 文件（只支持 CSV/Excel）
    pub async fn report_flagged_snapshot<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ApiResult<ValidationRunResult> {
        let source = FileMarketSource::flagged_snapshot(path);
        self.execute(&source, RunMode::ReportOnly).await
    }

    /// 并发校验多个快照文件（结果顺序与输入一致）
    pub async fn validate_files(&self, paths: &[PathBuf]) -> Vec<ApiResult<ValidationRunResult>> {
        info!(files = paths.len(), "开始并发校验快照文件");
        join_all(paths.iter().map(|path| self.validate_file(path))).await
    }

    // ==========================================
    // 运行记录查询
    // ==========================================

    pub async fn get_run(&self, run_id: &str) -> ApiResult<ValidationRunEntity> {
        let repo = self.require_repo()?;
        repo.get_run(run_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("校验运行记录(run_id={})不存在", run_id)))
    }

    pub async fn list_recent_runs(&self, limit: usize) -> ApiResult<Vec<ValidationRunEntity>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        let repo = self.require_repo()?;
        Ok(repo.list_recent_runs(limit).await?)
    }

    fn require_repo(&self) -> ApiResult<&Arc<dyn ValidationRunRepository>> {
        self.run_repo
            .as_ref()
            .ok_or_else(|| ApiError::InvalidInput("未配置运行记录仓储".to_string()))
    }

    // ==========================================
    // 内部流程
    // ==========================================

    #[instrument(skip_all, fields(source = %source.source_name(), run_id = tracing::field::Empty))]
    async fn execute(
        &self,
        source: &dyn MarketDataSource,
        mode: RunMode,
    ) -> ApiResult<ValidationRunResult> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        let execution_date = Utc::now()
            .with_timezone(&self.config().timezone())
            .date_naive();

        // === 步骤 1: 拉取数据 ===
        let payload = source.fetch().await.map_err(|e| {
            error!(error = %e, retryable = e.is_retryable(), "数据源获取失败");
            ApiError::Feed(e)
        })?;

        // === 步骤 2: 闸门 + 规则 + 报告 ===
        let outcome = match (mode, payload) {
            (RunMode::FullValidation, None) => self.orchestrator.run_batch(None)?,
            (RunMode::FullValidation, Some(FeedPayload::Batch(batch))) => {
                self.orchestrator.run_batch(Some(batch))?
            }
            (RunMode::FullValidation, Some(FeedPayload::Json(value))) => {
                self.orchestrator.run_json(Some(&value))?
            }
            (RunMode::ReportOnly, None) => self.orchestrator.report_flagged(None)?,
            (RunMode::ReportOnly, Some(FeedPayload::Batch(batch))) => {
                self.orchestrator.report_flagged(Some(batch))?
            }
            (RunMode::ReportOnly, Some(FeedPayload::Json(_))) => {
                error!("已标记快照必须是表格文件，JSON 载荷不含标记列");
                return Err(ApiError::InvalidInput(format!(
                    "已标记快照必须是 CSV/Excel 文件: {}",
                    source.source_name()
                )));
            }
        };

        // === 步骤 3: 导出快照 ===
        let (raw_file_path, flagged_file_path, report_file_path) =
            self.export(&outcome, mode, execution_date, &run_id)?;

        let mut result = ValidationRunResult {
            run_id,
            source: source.source_name(),
            execution_date,
            schema_status: outcome.schema_status,
            report: outcome.report,
            stats: outcome.stats,
            raw_file_path,
            flagged_file_path,
            report_file_path,
            elapsed_ms: 0,
        };
        result.elapsed_ms = start_time.elapsed().as_millis() as i64;

        // === 步骤 4: 落库 ===
        self.persist(&result).await?;

        // === 步骤 5: 通知 ===
        self.notifier.notify(&result).await?;

        info!(
            status = %result.report.status(),
            stage = result.report.stage(),
            elapsed_ms = result.elapsed_ms,
            "校验运行完成"
        );
        Ok(result)
    }

    fn export(
        &self,
        outcome: &PipelineOutcome,
        mode: RunMode,
        date: NaiveDate,
        run_id: &str,
    ) -> ApiResult<(Option<String>, Option<String>, Option<String>)> {
        let Some(exporter) = &self.exporter else {
            return Ok((None, None, None));
        };
        let to_string = |path: PathBuf| path.display().to_string();

        let mut raw_file_path = None;
        let mut flagged_file_path = None;
        if let Some(batch) = &outcome.batch {
            if mode == RunMode::FullValidation {
                raw_file_path = Some(to_string(exporter.export_raw(batch, date, run_id)?));
            }
            if outcome.rule_summary.is_some() {
                flagged_file_path = Some(to_string(exporter.export_flagged(batch, date, run_id)?));
            }
        }
        let report_file_path = Some(to_string(exporter.export_report(&outcome.report, date, run_id)?));

        Ok((raw_file_path, flagged_file_path, report_file_path))
    }

    async fn persist(&self, result: &ValidationRunResult) -> ApiResult<()> {
        let Some(repo) = &self.run_repo else {
            return Ok(());
        };

        let report_json = serde_json::to_string(&result.report)
            .map_err(|e| ApiError::InternalError(format!("报告序列化失败: {}", e)))?;
        let stats_json = result
            .stats
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::InternalError(format!("统计序列化失败: {}", e)))?;
        let total_rows = result
            .stats
            .as_ref()
            .map(|stats| stats.total_rows as i64)
            .unwrap_or(0);

        let entity = ValidationRunEntity {
            run_id: result.run_id.clone(),
            source: Some(result.source.clone()),
            stage: result.report.stage().to_string(),
            status: result.report.status().to_string(),
            schema_status: result.schema_status.to_string(),
            total_rows,
            report_json,
            stats_json,
            flagged_file_path: result.flagged_file_path.clone(),
            report_file_path: result.report_file_path.clone(),
            elapsed_ms: Some(result.elapsed_ms),
            created_at: Utc::now().with_timezone(&self.config().timezone()).to_rfc3339(),
        };
        repo.insert_run(&entity).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::{FeedError, FeedResult};
    use async_trait::async_trait;

    struct RateLimitedSource;

    #[async_trait]
    impl MarketDataSource for RateLimitedSource {
        fn source_name(&self) -> String {
            "rate-limited".to_string()
        }

        async fn fetch(&self) -> FeedResult<Option<FeedPayload>> {
            Err(FeedError::RateLimited { retry_after_secs: 60 })
        }
    }

    struct EmptySource;

    #[async_trait]
    impl MarketDataSource for EmptySource {
        fn source_name(&self) -> String {
            "empty".to_string()
        }

        async fn fetch(&self) -> FeedResult<Option<FeedPayload>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_feed_error_is_returned_not_reported() {
        let api = ValidationApi::new(ValidationConfig::default());
        let err = api.validate_source(&RateLimitedSource).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Feed(FeedError::RateLimited { retry_after_secs: 60 })
        ));
    }

    #[tokio::test]
    async fn test_no_batch_is_empty_data() {
        let api = ValidationApi::new(ValidationConfig::default());
        let result = api.validate_source(&EmptySource).await.unwrap();
        assert_eq!(result.schema_status, SchemaValidationStatus::EmptyData);
        assert!(result.is_failed());
        assert!(result.report_file_path.is_none());
    }

    #[tokio::test]
    async fn test_queries_require_repository() {
        let api = ValidationApi::new(ValidationConfig::default());
        assert!(matches!(
            api.list_recent_runs(10).await,
            Err(ApiError::InvalidInput(_))
        ));
    }
}
