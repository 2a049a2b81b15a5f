// ==========================================
// 加密货币行情数据质量校验系统 - 记录与批次模型
// ==========================================
// 职责: 单元格值、行情记录、记录批次（含质量标记侧表）
// 红线: 质量标记不落在记录字段里，按规则存放在侧表中（规则 → 按行下标的布尔列）
// ==========================================

use crate::domain::fields::FIELD_VALIDATED_AT;
use crate::domain::types::{QualityRule, RuleOutcome};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

static MISSING: CellValue = CellValue::Missing;

impl CellValue {
    /// 构造数值单元格（NaN 视为缺失）
    pub fn number(value: f64) -> Self {
        if value.is_nan() {
            CellValue::Missing
        } else {
            CellValue::Number(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// 从 JSON 值转换（null → 缺失，bool 按文本保留）
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Missing,
            Value::Number(n) => n.as_f64().map(CellValue::number).unwrap_or(CellValue::Missing),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// 转为 JSON 值（非有限数值 → null）
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Number(n) => Value::from(*n),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Missing => Value::Null,
        }
    }

    /// 导出快照时的文本形式（缺失 → 空串）
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Missing => String::new(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

// ==========================================
// MarketRecord - 单条行情记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketRecord {
    fields: HashMap<String, CellValue>,
}

impl MarketRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置字段（构造测试数据/接口数据时使用）
    pub fn with(mut self, field: &str, value: impl Into<CellValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: &str, value: CellValue) {
        self.fields.insert(field.to_string(), value);
    }

    /// 读取字段；记录中不存在的字段视为缺失
    pub fn get(&self, field: &str) -> &CellValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl From<HashMap<String, CellValue>> for MarketRecord {
    fn from(fields: HashMap<String, CellValue>) -> Self {
        Self { fields }
    }
}

// ==========================================
// RecordBatch - 记录批次
// ==========================================
// 列集合 = 所有记录出现过的字段并集（按首次出现顺序）
// flags: 已执行规则的标记列；不存在即该规则未执行
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    columns: Vec<String>,
    records: Vec<MarketRecord>,
    flags: BTreeMap<QualityRule, Vec<bool>>,
    validated_at: Option<String>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定表头创建空批次（零行文件也保留列信息）
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch = Self::new();
        for column in columns {
            batch.add_column(column.into());
        }
        batch
    }

    pub fn from_records(records: Vec<MarketRecord>) -> Self {
        let mut batch = Self::new();
        for record in records {
            batch.push(record);
        }
        batch
    }

    /// 从 JSON 载荷构造批次
    ///
    /// # 返回
    /// - Some(RecordBatch): 载荷是对象数组
    /// - None: 载荷不是表格形状（非数组，或数组元素不是对象）
    pub fn from_json(payload: &Value) -> Option<Self> {
        let rows = payload.as_array()?;
        let mut batch = Self::new();
        for row in rows {
            let object = row.as_object()?;
            let mut record = MarketRecord::new();
            for (key, value) in object {
                record.set(key, CellValue::from_json(value));
            }
            batch.push(record);
        }
        Some(batch)
    }

    fn add_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    /// 追加记录（更新列并集；已执行的标记列随之失效）
    pub fn push(&mut self, record: MarketRecord) {
        let mut new_columns: Vec<String> = record
            .field_names()
            .filter(|name| !self.columns.contains(name))
            .cloned()
            .collect();
        new_columns.sort();
        self.columns.extend(new_columns);
        self.records.push(record);
        self.flags.clear();
        self.validated_at = None;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_set(&self) -> HashSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    pub fn records(&self) -> &[MarketRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&MarketRecord> {
        self.records.get(index)
    }

    // ===== 质量标记侧表 =====

    /// 写入某条规则的标记列（长度必须等于批次行数，否则忽略并返回 false）
    pub fn set_flags(&mut self, rule: QualityRule, flags: Vec<bool>) -> bool {
        if flags.len() != self.records.len() {
            return false;
        }
        self.flags.insert(rule, flags);
        true
    }

    pub fn flags(&self, rule: QualityRule) -> Option<&[bool]> {
        self.flags.get(&rule).map(Vec::as_slice)
    }

    pub fn failed_count(&self, rule: QualityRule) -> Option<usize> {
        self.flags(rule)
            .map(|flags| flags.iter().filter(|flag| **flag).count())
    }

    /// 规则三态结果
    pub fn rule_outcome(&self, rule: QualityRule) -> RuleOutcome {
        match self.failed_count(rule) {
            None => RuleOutcome::NotRun,
            Some(count) => RuleOutcome::from_failed_count(count),
        }
    }

    pub fn set_validated_at(&mut self, validated_at: String) {
        self.validated_at = Some(validated_at);
    }

    pub fn validated_at(&self) -> Option<&str> {
        self.validated_at.as_deref()
    }

    // ===== 快照导出 =====

    /// 快照表头: 原始列 + 已执行规则的标记列 + validated_at
    pub fn snapshot_headers(&self) -> Vec<String> {
        let mut headers = self.columns.clone();
        headers.extend(self.flags.keys().map(|rule| rule.flag_field().to_string()));
        if self.validated_at.is_some() {
            headers.push(FIELD_VALIDATED_AT.to_string());
        }
        headers
    }

    /// 快照行（与 snapshot_headers 对齐）
    pub fn to_snapshot_rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let mut row: Vec<String> = self
                    .columns
                    .iter()
                    .map(|column| record.get(column).to_text())
                    .collect();
                row.extend(
                    self.flags
                        .values()
                        .map(|flags| flags.get(idx).copied().unwrap_or(false).to_string()),
                );
                if let Some(validated_at) = &self.validated_at {
                    row.push(validated_at.clone());
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_union_across_records() {
        let batch = RecordBatch::from_records(vec![
            MarketRecord::new().with("id", "bitcoin"),
            MarketRecord::new().with("id", "ethereum").with("symbol", "eth"),
        ]);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns(), &["id".to_string(), "symbol".to_string()]);
        assert!(batch.records()[0].get("symbol").is_missing());
    }

    #[test]
    fn test_from_json_rejects_non_table_payload() {
        assert!(RecordBatch::from_json(&json!({"id": "bitcoin"})).is_none());
        assert!(RecordBatch::from_json(&json!([1, 2, 3])).is_none());

        let batch = RecordBatch::from_json(&json!([
            {"id": "bitcoin", "current_price": 50000.0, "max_supply": null}
        ]))
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].get("current_price"), &CellValue::Number(50000.0));
        assert!(batch.records()[0].get("max_supply").is_missing());
        assert!(batch.has_column("max_supply"));
    }

    #[test]
    fn test_set_flags_requires_matching_length() {
        let mut batch = RecordBatch::from_records(vec![MarketRecord::new().with("id", "a")]);
        assert!(!batch.set_flags(QualityRule::Duplicates, vec![false, true]));
        assert_eq!(batch.rule_outcome(QualityRule::Duplicates), RuleOutcome::NotRun);

        assert!(batch.set_flags(QualityRule::Duplicates, vec![true]));
        assert_eq!(batch.rule_outcome(QualityRule::Duplicates), RuleOutcome::Failed(1));
    }

    #[test]
    fn test_push_invalidates_flags() {
        let mut batch = RecordBatch::from_records(vec![MarketRecord::new().with("id", "a")]);
        batch.set_flags(QualityRule::Duplicates, vec![false]);
        batch.push(MarketRecord::new().with("id", "a"));
        assert!(batch.flags(QualityRule::Duplicates).is_none());
    }

    #[test]
    fn test_snapshot_rows_include_flags_and_timestamp() {
        let mut batch = RecordBatch::from_records(vec![
            MarketRecord::new().with("id", "a").with("current_price", 1.5),
        ]);
        batch.set_flags(QualityRule::PriceRange, vec![false]);
        batch.set_validated_at("2026-01-21T10:00:00+08:00".to_string());

        let headers = batch.snapshot_headers();
        assert_eq!(
            headers,
            vec!["current_price", "id", "has_abnormal_price", "validated_at"]
        );
        let rows = batch.to_snapshot_rows();
        assert_eq!(rows[0], vec!["1.5", "a", "false", "2026-01-21T10:00:00+08:00"]);
    }

    #[test]
    fn test_snapshot_rows_tolerate_short_flag_column() {
        let mut batch = RecordBatch::from_records(vec![
            MarketRecord::new().with("id", "a"),
            MarketRecord::new().with("id", "b"),
        ]);
        batch.flags.insert(QualityRule::Duplicates, vec![true]);

        let rows = batch.to_snapshot_rows();
        assert_eq!(rows[0], vec!["a", "true"]);
        assert_eq!(rows[1], vec!["b", "false"]);
    }
}
