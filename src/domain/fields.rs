// ==========================================
// 加密货币行情数据质量校验系统 - 字段词表
// ==========================================
// 职责: 必填字段、数值字段、标记列、阈值默认值
// 红线: 必填字段固定 7 个，判定的是“列存在”，不是“值非空”
// ==========================================

pub const FIELD_ID: &str = "id";
pub const FIELD_SYMBOL: &str = "symbol";
pub const FIELD_NAME: &str = "name";
pub const FIELD_CURRENT_PRICE: &str = "current_price";
pub const FIELD_MARKET_CAP: &str = "market_cap";
pub const FIELD_TOTAL_VOLUME: &str = "total_volume";
pub const FIELD_CIRCULATING_SUPPLY: &str = "circulating_supply";

/// 元数据列: 校验时间
pub const FIELD_VALIDATED_AT: &str = "validated_at";

/// 必填字段（7 个）
pub const REQUIRED_FIELDS: [&str; 7] = [
    FIELD_ID,
    FIELD_SYMBOL,
    FIELD_NAME,
    FIELD_CURRENT_PRICE,
    FIELD_MARKET_CAP,
    FIELD_TOTAL_VOLUME,
    FIELD_CIRCULATING_SUPPLY,
];

/// 数值字段（行情接口中应为数字的列）
pub const NUMERIC_FIELDS: [&str; 13] = [
    FIELD_CURRENT_PRICE,
    FIELD_MARKET_CAP,
    "market_cap_rank",
    FIELD_TOTAL_VOLUME,
    "high_24h",
    "low_24h",
    "price_change_24h",
    "price_change_percentage_24h",
    "market_cap_change_24h",
    "market_cap_change_percentage_24h",
    FIELD_CIRCULATING_SUPPLY,
    "total_supply",
    "max_supply",
];

// ===== 阈值默认值 =====

/// 价格下限（USD，含）
pub const DEFAULT_PRICE_MIN: f64 = 0.000_001;

/// 价格上限（USD，含）
pub const DEFAULT_PRICE_MAX: f64 = 1_000_000.0;

/// 市值相对误差容忍度
pub const DEFAULT_MARKET_CAP_TOLERANCE: f64 = 0.05;

/// 每条规则失败样例上限
pub const DEFAULT_EXAMPLE_LIMIT: usize = 5;

/// 校验时间戳时区偏移（Asia/Taipei，UTC+8，无夏令时）
pub const DEFAULT_TIMEZONE_OFFSET_SECS: i32 = 8 * 3600;
