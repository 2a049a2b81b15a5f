// ==========================================
// 加密货币行情数据质量校验系统 - 应用层
// ==========================================
// 职责: 应用状态装配、默认路径解析
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_data_dir, get_default_db_path, AppState, ENV_DATA_DIR, ENV_DB_PATH};
