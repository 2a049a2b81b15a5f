// ==========================================
// 加密货币行情数据质量校验系统 - 质量规则
// ==========================================
// 职责: 五条逐行标记规则（互相独立，标记列互不相交）
// 红线:
// - 规则只读批次，输出与行数等长的布尔列，初值全部为 false
// - 缺失/不可解析的值不让规则失败，只决定该行是否被标记
// - 规则所需的列不存在时，整列为 false
// ==========================================

use crate::config::validation_config::ValidationConfig;
use crate::domain::fields::{
    FIELD_CIRCULATING_SUPPLY, FIELD_CURRENT_PRICE, FIELD_ID, FIELD_MARKET_CAP,
};
use crate::domain::record::{CellValue, RecordBatch};
use crate::domain::types::QualityRule;
use crate::engine::numeric::try_parse_number;
use std::collections::HashSet;

// ==========================================
// FlagRule Trait
// ==========================================
pub trait FlagRule: Send + Sync {
    /// 规则标识（决定标记列名与报告键）
    fn rule(&self) -> QualityRule;

    /// 逐行求值，返回与批次行数等长的标记列
    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool>;
}

/// 按配置构造规则实例
pub fn build_rule(rule: QualityRule, config: &ValidationConfig) -> Box<dyn FlagRule> {
    match rule {
        QualityRule::NumericTypes => Box::new(NumericTypeRule::new(config.numeric_fields.clone())),
        QualityRule::PriceRange => Box::new(PriceRangeRule::new(config.price_min, config.price_max)),
        QualityRule::MarketCap => {
            Box::new(MarketCapConsistencyRule::new(config.market_cap_tolerance))
        }
        QualityRule::MissingValues => {
            Box::new(MissingValuesRule::new(config.required_fields.clone()))
        }
        QualityRule::Duplicates => Box::new(DuplicateRule),
    }
}

// ==========================================
// NumericTypeRule - 数值字段可解析性
// ==========================================
// 对批次中存在的数值列: 值非缺失但无法解析 → 标记
pub struct NumericTypeRule {
    numeric_fields: Vec<String>,
}

impl NumericTypeRule {
    pub fn new(numeric_fields: Vec<String>) -> Self {
        Self { numeric_fields }
    }
}

impl FlagRule for NumericTypeRule {
    fn rule(&self) -> QualityRule {
        QualityRule::NumericTypes
    }

    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool> {
        let present: Vec<&str> = self
            .numeric_fields
            .iter()
            .map(String::as_str)
            .filter(|field| batch.has_column(field))
            .collect();

        batch
            .records()
            .iter()
            .map(|record| {
                present.iter().any(|field| {
                    let cell = record.get(field);
                    !cell.is_missing() && try_parse_number(cell).is_none()
                })
            })
            .collect()
    }
}

// ==========================================
// PriceRangeRule - 价格区间
// ==========================================
// 区间为闭区间 [min, max]；缺失或不可解析不标记
pub struct PriceRangeRule {
    min: f64,
    max: f64,
}

impl PriceRangeRule {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl FlagRule for PriceRangeRule {
    fn rule(&self) -> QualityRule {
        QualityRule::PriceRange
    }

    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool> {
        if !batch.has_column(FIELD_CURRENT_PRICE) {
            return vec![false; batch.len()];
        }

        batch
            .records()
            .iter()
            .map(|record| match try_parse_number(record.get(FIELD_CURRENT_PRICE)) {
                Some(price) => price < self.min || price > self.max,
                None => false,
            })
            .collect()
    }
}

// ==========================================
// MarketCapConsistencyRule - 市值一致性
// ==========================================
// expected = current_price × circulating_supply
// 三个值都可解析时:
//   market_cap ≤ 0                               → 标记
//   |market_cap − expected| / market_cap ≥ 容忍度 → 标记
// 任一值缺失/不可解析 → 不标记
pub struct MarketCapConsistencyRule {
    tolerance: f64,
}

impl MarketCapConsistencyRule {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    fn is_invalid(&self, market_cap: f64, price: f64, supply: f64) -> bool {
        if market_cap <= 0.0 {
            return true;
        }
        let expected = price * supply;
        let relative_error = (market_cap - expected).abs() / market_cap;
        relative_error >= self.tolerance
    }
}

impl FlagRule for MarketCapConsistencyRule {
    fn rule(&self) -> QualityRule {
        QualityRule::MarketCap
    }

    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool> {
        let has_all_columns = [FIELD_MARKET_CAP, FIELD_CURRENT_PRICE, FIELD_CIRCULATING_SUPPLY]
            .iter()
            .all(|field| batch.has_column(field));
        if !has_all_columns {
            return vec![false; batch.len()];
        }

        batch
            .records()
            .iter()
            .map(|record| {
                let market_cap = try_parse_number(record.get(FIELD_MARKET_CAP));
                let price = try_parse_number(record.get(FIELD_CURRENT_PRICE));
                let supply = try_parse_number(record.get(FIELD_CIRCULATING_SUPPLY));
                match (market_cap, price, supply) {
                    (Some(market_cap), Some(price), Some(supply)) => {
                        self.is_invalid(market_cap, price, supply)
                    }
                    _ => false,
                }
            })
            .collect()
    }
}

// ==========================================
// MissingValuesRule - 必填字段完整性
// ==========================================
// 任一必填字段缺失 → 标记（批次中不存在的必填列视为每行缺失）
pub struct MissingValuesRule {
    required_fields: Vec<String>,
}

impl MissingValuesRule {
    pub fn new(required_fields: Vec<String>) -> Self {
        Self { required_fields }
    }
}

impl FlagRule for MissingValuesRule {
    fn rule(&self) -> QualityRule {
        QualityRule::MissingValues
    }

    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool> {
        batch
            .records()
            .iter()
            .map(|record| {
                self.required_fields
                    .iter()
                    .any(|field| record.get(field).is_missing())
            })
            .collect()
    }
}

// ==========================================
// DuplicateRule - id 唯一性
// ==========================================
// 保留首次出现，之后相同 id 的行被标记；缺失 id（含 NaN）之间视为相等
pub struct DuplicateRule;

/// id 比较键（数值与文本不互相等同）
#[derive(Debug, PartialEq, Eq, Hash)]
enum IdKey {
    Number(u64),
    Text(String),
    Missing,
}

impl IdKey {
    fn of(cell: &CellValue) -> Self {
        match cell {
            CellValue::Number(n) if n.is_nan() => IdKey::Missing,
            CellValue::Number(n) if *n == 0.0 => IdKey::Number(0.0f64.to_bits()),
            CellValue::Number(n) => IdKey::Number(n.to_bits()),
            CellValue::Text(s) => IdKey::Text(s.clone()),
            CellValue::Missing => IdKey::Missing,
        }
    }
}

impl FlagRule for DuplicateRule {
    fn rule(&self) -> QualityRule {
        QualityRule::Duplicates
    }

    fn evaluate(&self, batch: &RecordBatch) -> Vec<bool> {
        if !batch.has_column(FIELD_ID) {
            return vec![false; batch.len()];
        }

        let mut seen = HashSet::new();
        batch
            .records()
            .iter()
            .map(|record| !seen.insert(IdKey::of(record.get(FIELD_ID))))
            .collect()
    }
}
