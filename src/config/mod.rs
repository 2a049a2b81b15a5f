// ==========================================
// 加密货币行情数据质量校验系统 - 配置层
// ==========================================
// 职责: 校验阈值配置 + 覆写项读取
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod validation_config;
pub mod validation_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use validation_config::ValidationConfig;
pub use validation_config_trait::{ConfigReadError, ValidationConfigReader};
