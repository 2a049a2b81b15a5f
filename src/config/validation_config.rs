// ==========================================
// 加密货币行情数据质量校验系统 - 校验配置
// ==========================================
// 职责: 校验引擎的静态配置（字段词表 + 阈值）
// 红线: 引擎实例只持有此配置，不持有任何按调用变化的状态
// ==========================================

use crate::domain::fields::{
    DEFAULT_EXAMPLE_LIMIT, DEFAULT_MARKET_CAP_TOLERANCE, DEFAULT_PRICE_MAX, DEFAULT_PRICE_MIN,
    DEFAULT_TIMEZONE_OFFSET_SECS, NUMERIC_FIELDS, REQUIRED_FIELDS,
};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ValidationConfig - 校验配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub required_fields: Vec<String>,
    pub numeric_fields: Vec<String>,
    pub price_min: f64,              // 价格下限（含）
    pub price_max: f64,              // 价格上限（含）
    pub market_cap_tolerance: f64,   // 市值相对误差容忍度
    pub example_limit: usize,        // 失败样例上限
    pub timezone_offset_secs: i32,   // validated_at 时区偏移
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            numeric_fields: NUMERIC_FIELDS.iter().map(|f| f.to_string()).collect(),
            price_min: DEFAULT_PRICE_MIN,
            price_max: DEFAULT_PRICE_MAX,
            market_cap_tolerance: DEFAULT_MARKET_CAP_TOLERANCE,
            example_limit: DEFAULT_EXAMPLE_LIMIT,
            timezone_offset_secs: DEFAULT_TIMEZONE_OFFSET_SECS,
        }
    }
}

impl ValidationConfig {
    /// validated_at 使用的时区；偏移非法时退回默认 UTC+8
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_secs)
            .or_else(|| FixedOffset::east_opt(DEFAULT_TIMEZONE_OFFSET_SECS))
            .unwrap_or_else(|| Utc.fix())
    }

    /// 阈值自检（下限 ≤ 上限、容忍度非负、样例上限 > 0）
    pub fn validate(&self) -> Result<(), String> {
        if !(self.price_min.is_finite() && self.price_max.is_finite()) {
            return Err("价格阈值必须为有限数".to_string());
        }
        if self.price_min > self.price_max {
            return Err(format!(
                "价格下限 {} 大于上限 {}",
                self.price_min, self.price_max
            ));
        }
        if self.market_cap_tolerance.is_nan() || self.market_cap_tolerance < 0.0 {
            return Err(format!(
                "市值容忍度非法: {}",
                self.market_cap_tolerance
            ));
        }
        if self.example_limit == 0 {
            return Err("样例上限必须大于 0".to_string());
        }
        Ok(())
    }
}
