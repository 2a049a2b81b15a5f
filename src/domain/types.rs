// ==========================================
// 加密货币行情数据质量校验系统 - 领域类型定义
// ==========================================
// 职责: 结构校验状态码、校验结果状态、质量规则枚举
// 序列化格式: snake_case 小写（与报告 JSON 一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 结构校验状态码 (Schema Validation Status)
// ==========================================
// 用途: 结构闸门输出，决定后续走规则校验还是错误报告分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaValidationStatus {
    Valid,                 // 结构合法
    EmptyData,             // 批次缺失或零行
    InvalidType,           // 非表格结构
    MissingRequiredFields, // 缺少必填列
}

impl SchemaValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaValidationStatus::Valid => "valid",
            SchemaValidationStatus::EmptyData => "empty_data",
            SchemaValidationStatus::InvalidType => "invalid_type",
            SchemaValidationStatus::MissingRequiredFields => "missing_required_fields",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SchemaValidationStatus::Valid)
    }
}

impl fmt::Display for SchemaValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 校验结果状态 (Validation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Passed => write!(f, "passed"),
            ValidationStatus::Failed => write!(f, "failed"),
            ValidationStatus::Skipped => write!(f, "skipped"),
        }
    }
}

// ==========================================
// 质量规则 (Quality Rule)
// ==========================================
// 五条规则列互不相交，声明顺序即报告顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRule {
    NumericTypes,
    PriceRange,
    MarketCap,
    MissingValues,
    Duplicates,
}

impl QualityRule {
    /// 全部规则（报告顺序）
    pub const ALL: [QualityRule; 5] = [
        QualityRule::NumericTypes,
        QualityRule::PriceRange,
        QualityRule::MarketCap,
        QualityRule::MissingValues,
        QualityRule::Duplicates,
    ];

    /// 报告中使用的规则名
    pub fn rule_name(&self) -> &'static str {
        match self {
            QualityRule::NumericTypes => "numeric_types",
            QualityRule::PriceRange => "price_range",
            QualityRule::MarketCap => "market_cap",
            QualityRule::MissingValues => "missing_values",
            QualityRule::Duplicates => "duplicates",
        }
    }

    /// 标记列名
    pub fn flag_field(&self) -> &'static str {
        match self {
            QualityRule::NumericTypes => "has_non_numeric_value",
            QualityRule::PriceRange => "has_abnormal_price",
            QualityRule::MarketCap => "has_invalid_market_cap",
            QualityRule::MissingValues => "has_missing_values",
            QualityRule::Duplicates => "has_duplicate",
        }
    }

    /// 失败样例投影列
    pub fn example_columns(&self) -> &'static [&'static str] {
        match self {
            QualityRule::NumericTypes => &["symbol", "name"],
            QualityRule::PriceRange => &["symbol", "name", "current_price"],
            QualityRule::MarketCap => &[
                "symbol",
                "name",
                "market_cap",
                "current_price",
                "circulating_supply",
            ],
            QualityRule::MissingValues => &["symbol", "name"],
            QualityRule::Duplicates => &["id", "symbol", "name"],
        }
    }

    /// 由标记列名反查规则（读取已标记快照时使用）
    pub fn from_flag_field(field: &str) -> Option<QualityRule> {
        QualityRule::ALL
            .into_iter()
            .find(|rule| rule.flag_field() == field)
    }
}

impl fmt::Display for QualityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_name())
    }
}

// ==========================================
// 规则执行结果 (Rule Outcome)
// ==========================================
// 三态: 未执行 / 通过 / 失败(失败行数)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    NotRun,
    Passed,
    Failed(usize),
}

impl RuleOutcome {
    pub fn from_failed_count(failed_count: usize) -> Self {
        if failed_count == 0 {
            RuleOutcome::Passed
        } else {
            RuleOutcome::Failed(failed_count)
        }
    }

    pub fn status(&self) -> ValidationStatus {
        match self {
            RuleOutcome::NotRun => ValidationStatus::Skipped,
            RuleOutcome::Passed => ValidationStatus::Passed,
            RuleOutcome::Failed(_) => ValidationStatus::Failed,
        }
    }
}
