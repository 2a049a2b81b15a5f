// ==========================================
// 加密货币行情数据质量校验系统 - 行情数据源
// ==========================================
// 职责: 定义数据源接口 + 基于快照文件的实现
// 红线:
// - 数据源要么给出载荷，要么返回 FeedError；不重试
// - Ok(None) 表示上游没有可用批次（按 EMPTY_DATA 处理）
// ==========================================

use crate::domain::record::RecordBatch;
use crate::importer::batch_builder::BatchBuilder;
use crate::importer::error::FeedResult;
use crate::importer::file_parser::{ParsedFile, UniversalFileParser};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

// ==========================================
// FeedPayload - 数据源载荷
// ==========================================
#[derive(Debug, Clone)]
pub enum FeedPayload {
    /// 已类型化的批次
    Batch(RecordBatch),
    /// 原始 JSON（形状由结构闸门判断）
    Json(Value),
}

impl FeedPayload {
    pub fn row_hint(&self) -> Option<usize> {
        match self {
            FeedPayload::Batch(batch) => Some(batch.len()),
            FeedPayload::Json(Value::Array(rows)) => Some(rows.len()),
            FeedPayload::Json(_) => None,
        }
    }
}

// ==========================================
// MarketDataSource Trait
// ==========================================
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 数据源标识（写入运行记录）
    fn source_name(&self) -> String;

    /// 拉取一批行情记录
    async fn fetch(&self) -> FeedResult<Option<FeedPayload>>;
}

// ==========================================
// FileMarketSource - 快照文件数据源
// ==========================================
pub struct FileMarketSource {
    path: PathBuf,
    builder: BatchBuilder,
}

impl FileMarketSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            builder: BatchBuilder::new(),
        }
    }

    /// 读取已标记快照（恢复标记列与 validated_at）
    pub fn flagged_snapshot<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            builder: BatchBuilder::restoring_flags(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MarketDataSource for FileMarketSource {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> FeedResult<Option<FeedPayload>> {
        // 零字节文件视为上游未提供批次
        if self.path.exists() && std::fs::metadata(&self.path)?.len() == 0 {
            info!("快照文件为空，视为无可用批次");
            return Ok(None);
        }

        let payload = match UniversalFileParser.parse(&self.path)? {
            ParsedFile::Table(table) => FeedPayload::Batch(self.builder.build(&table)),
            ParsedFile::Json(value) => FeedPayload::Json(value),
        };

        info!(rows = ?payload.row_hint(), "快照文件读取完成");
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::FeedError;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_csv_snapshot_becomes_batch() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,symbol,current_price").unwrap();
        writeln!(file, "bitcoin,btc,50000").unwrap();

        let source = FileMarketSource::new(file.path());
        match source.fetch().await.unwrap() {
            Some(FeedPayload::Batch(batch)) => assert_eq!(batch.len(), 1),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_file_is_no_batch() {
        let file = Builder::new().suffix(".csv").tempfile().unwrap();
        let source = FileMarketSource::new(file.path());
        assert!(source.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_feed_error() {
        let source = FileMarketSource::new("/nonexistent/crypto_raw.csv");
        assert!(matches!(source.fetch().await, Err(FeedError::FileNotFound(_))));
    }
}
