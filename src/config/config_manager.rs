// ==========================================
// 加密货币行情数据质量校验系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::validation_config_trait::{ConfigReadError, ValidationConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::fields::{
    DEFAULT_EXAMPLE_LIMIT, DEFAULT_MARKET_CAP_TOLERANCE, DEFAULT_PRICE_MAX, DEFAULT_PRICE_MIN,
    DEFAULT_TIMEZONE_OFFSET_SECS,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const PRICE_MIN: &str = "dq_price_min";
    pub const PRICE_MAX: &str = "dq_price_max";
    pub const MARKET_CAP_TOLERANCE: &str = "dq_market_cap_tolerance";
    pub const EXAMPLE_LIMIT: &str = "dq_example_limit";
    pub const TIMEZONE_OFFSET_HOURS: &str = "dq_timezone_offset_hours";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigReadError> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigReadError> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置值；缺失或格式错误时返回默认值
    ///
    /// 说明：格式错误只记录警告，不阻断校验
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigReadError>
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!(key = %key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> Result<HashMap<String, String>, ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

#[async_trait]
impl ValidationConfigReader for ConfigManager {
    async fn get_price_min(&self) -> Result<f64, ConfigReadError> {
        self.get_parsed_or_default(config_keys::PRICE_MIN, DEFAULT_PRICE_MIN)
    }

    async fn get_price_max(&self) -> Result<f64, ConfigReadError> {
        self.get_parsed_or_default(config_keys::PRICE_MAX, DEFAULT_PRICE_MAX)
    }

    async fn get_market_cap_tolerance(&self) -> Result<f64, ConfigReadError> {
        self.get_parsed_or_default(
            config_keys::MARKET_CAP_TOLERANCE,
            DEFAULT_MARKET_CAP_TOLERANCE,
        )
    }

    async fn get_example_limit(&self) -> Result<usize, ConfigReadError> {
        self.get_parsed_or_default(config_keys::EXAMPLE_LIMIT, DEFAULT_EXAMPLE_LIMIT)
    }

    async fn get_timezone_offset_hours(&self) -> Result<i32, ConfigReadError> {
        self.get_parsed_or_default(
            config_keys::TIMEZONE_OFFSET_HOURS,
            DEFAULT_TIMEZONE_OFFSET_SECS / 3600,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation_config::ValidationConfig;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn create_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_no_overrides() {
        let manager = create_manager();
        let config = manager.load_validation_config().await.unwrap();
        assert_eq!(config, ValidationConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_are_applied() {
        let manager = create_manager();
        manager.set_global_config_value(config_keys::PRICE_MAX, "500000").unwrap();
        manager.set_global_config_value(config_keys::EXAMPLE_LIMIT, "3").unwrap();
        manager.set_global_config_value(config_keys::TIMEZONE_OFFSET_HOURS, "0").unwrap();

        let config = manager.load_validation_config().await.unwrap();
        assert_eq!(config.price_max, 500000.0);
        assert_eq!(config.example_limit, 3);
        assert_eq!(config.timezone_offset_secs, 0);
        assert_eq!(config.price_min, DEFAULT_PRICE_MIN);
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back_to_default() {
        let manager = create_manager();
        manager
            .set_global_config_value(config_keys::MARKET_CAP_TOLERANCE, "five percent")
            .unwrap();

        let tolerance = manager.get_market_cap_tolerance().await.unwrap();
        assert_eq!(tolerance, DEFAULT_MARKET_CAP_TOLERANCE);
    }

    #[tokio::test]
    async fn test_inverted_range_falls_back_to_defaults() {
        let manager = create_manager();
        manager.set_global_config_value(config_keys::PRICE_MIN, "100").unwrap();
        manager.set_global_config_value(config_keys::PRICE_MAX, "1").unwrap();

        let config = manager.load_validation_config().await.unwrap();
        assert_eq!(config, ValidationConfig::default());
        assert_eq!(manager.get_config_snapshot().unwrap().len(), 2);
    }
}
