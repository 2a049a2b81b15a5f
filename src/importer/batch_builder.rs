// ==========================================
// 加密货币行情数据质量校验系统 - 批次构建器
// ==========================================
// 职责: 原始表格 → RecordBatch
// 流程: NULL 标准化 → 按列推断数值 → 恢复标记列与 validated_at（读取已标记快照时）
// 红线: 构建过程不丢列、不丢行；无法识别的值保留为文本，交给规则判断
// ==========================================

use crate::domain::fields::FIELD_VALIDATED_AT;
use crate::domain::record::{CellValue, MarketRecord, RecordBatch};
use crate::domain::types::QualityRule;
use crate::importer::file_parser::RawTable;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 视为缺失的文本值
pub const NULL_TOKENS: [&str; 14] = [
    "", "NaN", "nan", "NAN", "null", "NULL", "Null", "None", "none", "N/A", "n/a", "NA", "<NA>",
    "#N/A",
];

pub fn is_null_token(value: &str) -> bool {
    NULL_TOKENS.contains(&value.trim())
}

/// 解析标记列取值
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" | "1" | "1.0" => Some(true),
        "false" | "False" | "FALSE" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

// ==========================================
// BatchBuilder - 批次构建器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    restore_flags: bool,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取已标记快照时使用: 标记列与 validated_at 恢复到侧表，而不是作为普通列
    pub fn restoring_flags() -> Self {
        Self {
            restore_flags: true,
        }
    }

    /// 构建批次
    ///
    /// # 逻辑
    /// 1. NULL 标记 → 缺失
    /// 2. 某列所有非缺失值都可解析为数值 → 该列存为数值，否则保留文本
    /// 3. 可选: 恢复标记列与 validated_at
    pub fn build(&self, table: &RawTable) -> RecordBatch {
        let mut data_columns: Vec<(usize, &str)> = Vec::new();
        let mut flag_columns: Vec<(usize, QualityRule)> = Vec::new();
        let mut validated_at_column: Option<usize> = None;

        for (idx, header) in table.headers.iter().enumerate() {
            if self.restore_flags {
                if let Some(rule) = QualityRule::from_flag_field(header) {
                    flag_columns.push((idx, rule));
                    continue;
                }
                if header == FIELD_VALIDATED_AT {
                    validated_at_column = Some(idx);
                    continue;
                }
            }
            data_columns.push((idx, header.as_str()));
        }

        let numeric_columns: Vec<bool> = data_columns
            .iter()
            .map(|(idx, _)| Self::is_numeric_column(table, *idx))
            .collect();

        let mut batch = RecordBatch::with_columns(data_columns.iter().map(|(_, h)| *h));
        for row in &table.rows {
            let mut fields = HashMap::with_capacity(data_columns.len());
            for ((idx, header), numeric) in data_columns.iter().zip(&numeric_columns) {
                let raw = row.get(*idx).map(String::as_str).unwrap_or("");
                fields.insert(header.to_string(), Self::to_cell(raw, *numeric));
            }
            batch.push(MarketRecord::from(fields));
        }

        // 标记列必须在所有记录追加完成后写入
        for (idx, rule) in flag_columns {
            self.restore_rule_flags(&mut batch, table, idx, rule);
        }
        if let Some(idx) = validated_at_column {
            let validated_at = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .find(|v| !is_null_token(v));
            if let Some(validated_at) = validated_at {
                batch.set_validated_at(validated_at.trim().to_string());
            }
        }

        debug!(
            rows = batch.len(),
            columns = batch.columns().len(),
            "批次构建完成"
        );
        batch
    }

    fn is_numeric_column(table: &RawTable, idx: usize) -> bool {
        let mut values = table
            .rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter(|v| !is_null_token(v))
            .peekable();
        values.peek().is_some() && values.all(|v| v.trim().parse::<f64>().is_ok())
    }

    fn to_cell(raw: &str, numeric: bool) -> CellValue {
        if is_null_token(raw) {
            return CellValue::Missing;
        }
        if numeric {
            if let Ok(n) = raw.trim().parse::<f64>() {
                return CellValue::number(n);
            }
        }
        CellValue::text(raw.trim())
    }

    fn restore_rule_flags(&self, batch: &mut RecordBatch, table: &RawTable, idx: usize, rule: QualityRule) {
        let parsed: Option<Vec<bool>> = table
            .rows
            .iter()
            .map(|row| parse_flag(row.get(idx).map(String::as_str).unwrap_or("")))
            .collect();

        match parsed {
            Some(flags) => {
                batch.set_flags(rule, flags);
            }
            None => {
                warn!(rule = %rule, column = rule.flag_field(), "标记列包含无法识别的值，视为规则未执行");
            }
        }
    }
}
