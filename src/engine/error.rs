// ==========================================
// 加密货币行情数据质量校验系统 - 引擎层错误类型
// ==========================================
// 结构闸门与规则本身从不失败；唯一的引擎错误是调用约定被破坏
// ==========================================

use crate::domain::types::SchemaValidationStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 对未通过结构闸门的批次生成校验报告
    #[error("批次未通过结构校验 ({status})，不能生成规则校验报告")]
    UngatedBatch { status: SchemaValidationStatus },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
