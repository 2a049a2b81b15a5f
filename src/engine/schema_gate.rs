// ==========================================
// 加密货币行情数据质量校验系统 - 结构闸门
// ==========================================
// 职责: 规则校验前的结构预检
// 检查顺序（首个失败条件胜出）:
//   1. 批次缺失/null   → EMPTY_DATA
//   2. 非表格结构      → INVALID_TYPE
//   3. 零行            → EMPTY_DATA
//   4. 缺少必填列      → MISSING_REQUIRED_FIELDS
//   5. 其余            → VALID
// 红线: 纯函数，不修改批次；必填字段只看列是否存在，不看值是否为空
// ==========================================

use crate::domain::fields::REQUIRED_FIELDS;
use crate::domain::record::RecordBatch;
use crate::domain::types::SchemaValidationStatus;
use serde_json::Value;
use tracing::debug;

// ==========================================
// BatchInput - 闸门输入
// ==========================================
// Table: 已类型化的批次（必然是表格形状）
// Json:  上游原始载荷（可能不是对象数组）
#[derive(Debug, Clone, Copy)]
pub enum BatchInput<'a> {
    Table(&'a RecordBatch),
    Json(&'a Value),
}

impl<'a> From<&'a RecordBatch> for BatchInput<'a> {
    fn from(batch: &'a RecordBatch) -> Self {
        BatchInput::Table(batch)
    }
}

impl<'a> From<&'a Value> for BatchInput<'a> {
    fn from(payload: &'a Value) -> Self {
        BatchInput::Json(payload)
    }
}

// ==========================================
// SchemaGate - 结构闸门
// ==========================================
#[derive(Debug, Clone)]
pub struct SchemaGate {
    required_fields: Vec<String>,
}

impl Default for SchemaGate {
    fn default() -> Self {
        Self::new(REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect())
    }
}

impl SchemaGate {
    pub fn new(required_fields: Vec<String>) -> Self {
        Self { required_fields }
    }

    /// 结构校验
    ///
    /// # 参数
    /// - input: None 或 JSON null 表示上游没有提供批次
    pub fn validate_schema(&self, input: Option<BatchInput<'_>>) -> SchemaValidationStatus {
        let status = match input {
            None | Some(BatchInput::Json(Value::Null)) => SchemaValidationStatus::EmptyData,
            Some(BatchInput::Table(batch)) => self.validate_table(batch),
            Some(BatchInput::Json(payload)) => match RecordBatch::from_json(payload) {
                Some(batch) => self.validate_table(&batch),
                None => SchemaValidationStatus::InvalidType,
            },
        };

        debug!(status = %status, "结构校验完成");
        status
    }

    /// 对已类型化批次做结构校验（跳过表格形状检查）
    pub fn validate_table(&self, batch: &RecordBatch) -> SchemaValidationStatus {
        if batch.is_empty() {
            return SchemaValidationStatus::EmptyData;
        }

        if !self.missing_fields(batch).is_empty() {
            return SchemaValidationStatus::MissingRequiredFields;
        }

        SchemaValidationStatus::Valid
    }

    /// 批次列集合中缺少的必填字段（按必填字段声明顺序）
    pub fn missing_fields<'a>(&'a self, batch: &RecordBatch) -> Vec<&'a str> {
        let columns = batch.column_set();
        self.required_fields
            .iter()
            .map(String::as_str)
            .filter(|field| !columns.contains(field))
            .collect()
    }
}

/// 使用默认必填字段做结构校验
pub fn validate_schema(input: Option<BatchInput<'_>>) -> SchemaValidationStatus {
    SchemaGate::default().validate_schema(input)
}
