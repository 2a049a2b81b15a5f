// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试批次生成等功能
// ==========================================

#![allow(dead_code)]

use crypto_market_dq::db::{configure_sqlite_connection, init_schema};
use crypto_market_dq::domain::{MarketRecord, RecordBatch};
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = Connection::open(&db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入一个 global 配置覆写项
pub fn set_global_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// 字段齐全且数值一致的行情记录（market_cap = price × supply）
pub fn coin(id: &str, price: f64) -> MarketRecord {
    let supply = 1_000_000.0;
    MarketRecord::new()
        .with("id", id)
        .with("symbol", id.chars().take(3).collect::<String>().as_str())
        .with("name", id)
        .with("current_price", price)
        .with("market_cap", price * supply)
        .with("total_volume", 1_000.0)
        .with("circulating_supply", supply)
}

/// 全部字段齐全且通过所有规则的批次
pub fn clean_batch(n: usize) -> RecordBatch {
    RecordBatch::from_records(
        (0..n)
            .map(|i| coin(&format!("coin-{}", i), 1.0 + i as f64))
            .collect(),
    )
}

/// 四条记录的混合问题批次
///
/// - 记录 1、2 共享 id "bitcoin"
/// - 记录 2 current_price 为非数值文本
/// - 记录 3 current_price 远超上限
/// - 记录 4 id 缺失
pub fn problem_batch() -> RecordBatch {
    RecordBatch::from_records(vec![
        coin("bitcoin", 50_000.0),
        coin("bitcoin", 50_000.0).with("current_price", "not-a-price"),
        coin("ethereum", 3_000.0).with("current_price", 5_000_000_000.0),
        coin("solana", 100.0).with("id", None::<f64>),
    ])
}

/// 问题批次对应的 CSV 文本
pub const PROBLEM_CSV: &str = "\
id,symbol,name,current_price,market_cap,total_volume,circulating_supply,max_supply
bitcoin,btc,Bitcoin,50000,50000000000,1000,1000000,21000000
bitcoin,btc,Bitcoin,not-a-price,50000000000,1000,1000000,21000000
ethereum,eth,Ethereum,5000000000,3000000000,1000,1000000,
,sol,Solana,100,100000000,1000,1000000,N/A
";

/// 干净批次对应的 CSV 文本
pub const CLEAN_CSV: &str = "\
id,symbol,name,current_price,market_cap,total_volume,circulating_supply
bitcoin,btc,Bitcoin,50000,50000000000,1000,1000000
ethereum,eth,Ethereum,3000,3000000000,1000,1000000
";

/// 在目录中写入文件
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("创建测试文件失败");
    file.write_all(content.as_bytes()).expect("写入测试文件失败");
    path
}

/// 创建临时目录
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("创建临时目录失败")
}
