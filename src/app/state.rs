// ==========================================
// 加密货币行情数据质量校验系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use crate::api::{ApiResult, ValidationApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "CRYPTO_DQ_DB_PATH";

/// 快照目录环境变量
pub const ENV_DATA_DIR: &str = "CRYPTO_DQ_DATA_DIR";

const APP_DIR_NAME: &str = "crypto-market-dq";
const DB_FILE_NAME: &str = "crypto_market_dq.db";

/// 应用状态
///
/// 包含API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 快照导出根目录
    pub data_dir: PathBuf,

    /// 校验API
    pub validation_api: Arc<ValidationApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - data_dir: 快照导出根目录
    pub async fn new(db_path: String, data_dir: PathBuf) -> ApiResult<Self> {
        info!(db_path = %db_path, data_dir = %data_dir.display(), "初始化应用状态");

        let validation_api = ValidationApi::from_db_path(&db_path, Some(data_dir.clone())).await?;

        Ok(Self {
            db_path,
            data_dir,
            validation_api: Arc::new(validation_api),
        })
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 应用数据目录（用户数据目录下的独立子目录，取不到时使用当前目录）
fn app_data_root() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => {
            let path = data_dir.join(APP_DIR_NAME);
            // 目录创建失败时由后续打开文件的步骤报错
            std::fs::create_dir_all(&path).ok();
            path
        }
        None => PathBuf::from("."),
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 CRYPTO_DQ_DB_PATH
/// 2. 用户数据目录/crypto-market-dq/crypto_market_dq.db
/// 3. ./crypto_market_dq.db
pub fn get_default_db_path() -> String {
    if let Some(path) = env_override(ENV_DB_PATH) {
        return path;
    }
    app_data_root().join(DB_FILE_NAME).to_string_lossy().to_string()
}

/// 获取默认快照导出目录
///
/// # 优先级
/// 1. 环境变量 CRYPTO_DQ_DATA_DIR
/// 2. 用户数据目录/crypto-market-dq/data
/// 3. ./data
pub fn get_default_data_dir() -> PathBuf {
    if let Some(path) = env_override(ENV_DATA_DIR) {
        return PathBuf::from(path);
    }
    app_data_root().join("data")
}
