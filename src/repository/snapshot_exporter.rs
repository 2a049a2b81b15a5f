// ==========================================
// 加密货币行情数据质量校验系统 - 快照文件导出
// ==========================================
// 目录结构（以 out_dir 为根）:
//   raw/crypto_raw_<date>_<run_id>.csv
//   flagged/flagged_<date>_<run_id>.csv
//   reports/quality_report_<date>_<run_id>.json
//   reports/schema_error_report_<date>_<run_id>.json
// 红线:
// - 只写文件，不修改批次与报告
// - 文件名带 run_id，同日多次运行互不覆盖
// ==========================================

use crate::domain::record::RecordBatch;
use crate::domain::report::QualityReport;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use csv::Writer;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

// ==========================================
// SnapshotExporter - 快照导出器
// ==========================================
#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    out_dir: PathBuf,
}

impl SnapshotExporter {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn raw_path(&self, date: NaiveDate, run_id: &str) -> PathBuf {
        self.out_dir
            .join("raw")
            .join(format!("crypto_raw_{}_{}.csv", date.format("%Y-%m-%d"), run_id))
    }

    pub fn flagged_path(&self, date: NaiveDate, run_id: &str) -> PathBuf {
        self.out_dir
            .join("flagged")
            .join(format!("flagged_{}_{}.csv", date.format("%Y-%m-%d"), run_id))
    }

    pub fn report_path(&self, report: &QualityReport, date: NaiveDate, run_id: &str) -> PathBuf {
        let prefix = match report {
            QualityReport::Validation(_) => "quality_report",
            QualityReport::SchemaError(_) => "schema_error_report",
        };
        self.out_dir
            .join("reports")
            .join(format!("{}_{}_{}.json", prefix, date.format("%Y-%m-%d"), run_id))
    }

    /// 导出原始批次（只含数据列）
    pub fn export_raw(
        &self,
        batch: &RecordBatch,
        date: NaiveDate,
        run_id: &str,
    ) -> RepositoryResult<PathBuf> {
        let path = self.raw_path(date, run_id);
        let rows = batch.records().iter().map(|record| {
            batch
                .columns()
                .iter()
                .map(|column| record.get(column).to_text())
                .collect::<Vec<_>>()
        });
        write_csv(&path, batch.columns(), rows)?;

        info!(path = %path.display(), rows = batch.len(), "原始快照已导出");
        Ok(path)
    }

    /// 导出已标记批次（数据列 + 标记列 + validated_at）
    pub fn export_flagged(
        &self,
        batch: &RecordBatch,
        date: NaiveDate,
        run_id: &str,
    ) -> RepositoryResult<PathBuf> {
        let path = self.flagged_path(date, run_id);
        write_csv(&path, &batch.snapshot_headers(), batch.to_snapshot_rows())?;

        info!(path = %path.display(), rows = batch.len(), "标记快照已导出");
        Ok(path)
    }

    /// 导出报告 JSON（格式化输出）
    pub fn export_report(
        &self,
        report: &QualityReport,
        date: NaiveDate,
        run_id: &str,
    ) -> RepositoryResult<PathBuf> {
        let path = self.report_path(report, date, run_id);
        ensure_parent(&path)?;

        let file = File::create(&path).map_err(|e| file_error(&path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report)?;

        info!(path = %path.display(), stage = report.stage(), "校验报告已导出");
        Ok(path)
    }
}

fn file_error(path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FileWriteError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn ensure_parent(path: &Path) -> RepositoryResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| file_error(parent, e))?;
    }
    Ok(())
}

fn write_csv<I>(path: &Path, headers: &[String], rows: I) -> RepositoryResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    ensure_parent(path)?;

    let mut writer = Writer::from_path(path).map_err(|e| file_error(path, e))?;
    writer.write_record(headers).map_err(|e| file_error(path, e))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| file_error(path, e))?;
    }
    writer.flush().map_err(|e| file_error(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::MarketRecord;
    use crate::domain::types::{QualityRule, SchemaValidationStatus};
    use crate::engine::report_builder::ReportBuilder;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 21).unwrap()
    }

    #[test]
    fn test_export_raw_and_flagged() {
        let dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(dir.path());

        let mut batch = RecordBatch::from_records(vec![
            MarketRecord::new().with("id", "bitcoin").with("current_price", 50000.0),
        ]);
        let raw_path = exporter.export_raw(&batch, date(), "run-1").unwrap();
        assert!(raw_path.ends_with("raw/crypto_raw_2026-01-21_run-1.csv"));
        assert_eq!(
            fs::read_to_string(&raw_path).unwrap(),
            "current_price,id\n50000,bitcoin\n"
        );

        batch.set_flags(QualityRule::Duplicates, vec![false]);
        batch.set_validated_at("2026-01-21T10:00:00+08:00".to_string());
        let flagged_path = exporter.export_flagged(&batch, date(), "run-1").unwrap();
        assert!(flagged_path.ends_with("flagged/flagged_2026-01-21_run-1.csv"));
        assert_eq!(
            fs::read_to_string(&flagged_path).unwrap(),
            "current_price,id,has_duplicate,validated_at\n50000,bitcoin,false,2026-01-21T10:00:00+08:00\n"
        );
    }

    #[test]
    fn test_export_schema_error_report() {
        let dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let report = QualityReport::SchemaError(
            ReportBuilder::default().generate_schema_error_report(SchemaValidationStatus::EmptyData),
        );

        let path = exporter.export_report(&report, date(), "run-1").unwrap();
        assert!(path.ends_with("reports/schema_error_report_2026-01-21_run-1.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["error"], "empty_data");
    }

    #[test]
    fn test_same_day_runs_do_not_share_files() {
        let dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let first = RecordBatch::from_records(vec![MarketRecord::new().with("id", "bitcoin")]);
        let second = RecordBatch::from_records(vec![MarketRecord::new().with("id", "ethereum")]);

        let first_path = exporter.export_flagged(&first, date(), "run-1").unwrap();
        let second_path = exporter.export_flagged(&second, date(), "run-2").unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(fs::read_to_string(&first_path).unwrap(), "id\nbitcoin\n");
        assert_eq!(fs::read_to_string(&second_path).unwrap(), "id\nethereum\n");
    }
}
