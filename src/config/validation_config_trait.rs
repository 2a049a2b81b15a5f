// ==========================================
// 加密货币行情数据质量校验系统 - 校验配置读取 Trait
// ==========================================
// 职责: 定义校验引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::validation_config::ValidationConfig;
use async_trait::async_trait;
use std::error::Error;
use tracing::warn;

/// 配置读取错误（跨 await 需要 Send + Sync）
pub type ConfigReadError = Box<dyn Error + Send + Sync>;

// ==========================================
// ValidationConfigReader Trait
// ==========================================
// 用途: 读取阈值覆写项，合并到默认配置上
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ValidationConfigReader: Send + Sync {
    /// 获取价格下限（USD，含）
    ///
    /// # 默认值
    /// - 0.000001
    async fn get_price_min(&self) -> Result<f64, ConfigReadError>;

    /// 获取价格上限（USD，含）
    ///
    /// # 默认值
    /// - 1000000
    async fn get_price_max(&self) -> Result<f64, ConfigReadError>;

    /// 获取市值相对误差容忍度
    ///
    /// # 默认值
    /// - 0.05
    async fn get_market_cap_tolerance(&self) -> Result<f64, ConfigReadError>;

    /// 获取每条规则的失败样例上限
    ///
    /// # 默认值
    /// - 5
    async fn get_example_limit(&self) -> Result<usize, ConfigReadError>;

    /// 获取 validated_at 时区偏移（小时）
    ///
    /// # 默认值
    /// - 8（Asia/Taipei）
    async fn get_timezone_offset_hours(&self) -> Result<i32, ConfigReadError>;

    /// 汇总为完整的校验配置
    ///
    /// # 逻辑
    /// 1. 从默认配置出发，逐项读取覆写值
    /// 2. 合并后自检；自检失败则整体退回默认配置（记录警告）
    async fn load_validation_config(&self) -> Result<ValidationConfig, ConfigReadError> {
        let config = ValidationConfig {
            price_min: self.get_price_min().await?,
            price_max: self.get_price_max().await?,
            market_cap_tolerance: self.get_market_cap_tolerance().await?,
            example_limit: self.get_example_limit().await?,
            timezone_offset_secs: self.get_timezone_offset_hours().await?.saturating_mul(3600),
            ..ValidationConfig::default()
        };

        match config.validate() {
            Ok(()) => Ok(config),
            Err(reason) => {
                warn!(reason = %reason, "校验配置非法，使用默认配置");
                Ok(ValidationConfig::default())
            }
        }
    }
}
