// ==========================================
// 加密货币行情数据质量校验系统 - 数值解析
// ==========================================
// 职责: 单元格 → 数值的显式尝试解析（所有规则共用）
// 红线: 永不 panic、永不返回错误；不可解析即 None
// ==========================================

use crate::domain::record::CellValue;

/// 尝试把单元格解析为数值
///
/// # 规则
/// - 数值: 原样返回（NaN → None）
/// - 文本: 去除首尾空白后按浮点数解析（"inf"/"1e3" 可解析，"NaN"/"abc" 不可解析）
/// - 缺失: None
pub fn try_parse_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_nan() => None,
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        CellValue::Missing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_passthrough() {
        assert_eq!(try_parse_number(&CellValue::Number(42.5)), Some(42.5));
        assert_eq!(try_parse_number(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_text_parsing() {
        assert_eq!(try_parse_number(&CellValue::text(" 1.25 ")), Some(1.25));
        assert_eq!(try_parse_number(&CellValue::text("1e3")), Some(1000.0));
        assert_eq!(try_parse_number(&CellValue::text("abc")), None);
        assert_eq!(try_parse_number(&CellValue::text("")), None);
        assert_eq!(try_parse_number(&CellValue::text("NaN")), None);
        assert_eq!(
            try_parse_number(&CellValue::text("inf")),
            Some(f64::INFINITY)
        );
    }

    #[test]
    fn test_missing_is_none() {
        assert_eq!(try_parse_number(&CellValue::Missing), None);
    }
}
