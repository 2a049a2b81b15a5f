// ==========================================
// 加密货币行情数据质量校验系统 - 数据源层
// ==========================================
// 职责: 外部行情数据读取，生成 RecordBatch
// 支持: CSV, Excel, JSON 快照文件
// ==========================================

// 模块声明
pub mod batch_builder;
pub mod error;
pub mod file_parser;
pub mod market_source;

// 重导出核心类型
pub use batch_builder::{is_null_token, BatchBuilder, NULL_TOKENS};
pub use error::{FeedError, FeedResult};
pub use file_parser::{
    CsvParser, ExcelParser, FileParser, JsonParser, ParsedFile, RawTable, UniversalFileParser,
};
pub use market_source::{FeedPayload, FileMarketSource, MarketDataSource};
