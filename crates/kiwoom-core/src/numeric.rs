//! 응답 숫자 필드 정규화.
//!
//! 시세 API는 숫자를 문자열로 내려주며 천 단위 구분자(`1,234`)나
//! 부호(`+70100`, `-56`)가 붙을 수 있습니다. 하한가 등에서는 크기에
//! 부호가 섞여 오므로 저장 값은 절대값을 사용합니다.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;

/// 상장주식수 환산 배수 (천주 → 주).
pub const LISTED_SHARES_SCALE: u64 = 1_000;

/// 시가총액 환산 배수 (억원 → 원).
pub const MARKET_CAP_SCALE: u64 = 100_000_000;

/// JSON 필드 값을 정수로 변환합니다.
///
/// - `null`, 빈 문자열 → 0
/// - 숫자 → 소수점 이하 버림
/// - 문자열 → 쉼표와 공백 제거 후 파싱 (실수도 허용, 소수점 이하 버림)
pub fn normalize_int(value: &Value) -> CoreResult<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| CoreError::InvalidNumber(n.to_string())),
        Value::String(s) => parse_numeric_str(s),
        other => Err(CoreError::InvalidNumber(other.to_string())),
    }
}

/// 정규화한 값의 절대값.
pub fn magnitude(value: &Value) -> CoreResult<u64> {
    normalize_int(value).map(i64::unsigned_abs)
}

/// 절대값에 단위 환산 배수를 곱합니다.
pub fn scaled_magnitude(value: &Value, scale: u64) -> CoreResult<u64> {
    magnitude(value).map(|v| v.saturating_mul(scale))
}

fn parse_numeric_str(raw: &str) -> CoreResult<i64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(0);
    }

    if let Ok(v) = cleaned.parse::<i64>() {
        return Ok(v);
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
        .ok_or_else(|| CoreError::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_int_variants() {
        assert_eq!(normalize_int(&Value::Null).unwrap(), 0);
        assert_eq!(normalize_int(&json!("")).unwrap(), 0);
        assert_eq!(normalize_int(&json!("  ")).unwrap(), 0);
        assert_eq!(normalize_int(&json!(1234)).unwrap(), 1234);
        assert_eq!(normalize_int(&json!(12.9)).unwrap(), 12);
        assert_eq!(normalize_int(&json!("1,234")).unwrap(), 1234);
        assert_eq!(normalize_int(&json!("+70100")).unwrap(), 70100);
        assert_eq!(normalize_int(&json!("-56")).unwrap(), -56);
        assert_eq!(normalize_int(&json!("-1,250.75")).unwrap(), -1250);
    }

    #[test]
    fn test_normalize_int_rejects_garbage() {
        assert!(normalize_int(&json!("N/A")).is_err());
        assert!(normalize_int(&json!(true)).is_err());
        assert!(normalize_int(&json!(["1"])).is_err());
    }

    #[test]
    fn test_scaled_magnitude() {
        assert_eq!(scaled_magnitude(&json!("1,234"), LISTED_SHARES_SCALE).unwrap(), 1_234_000);
        assert_eq!(scaled_magnitude(&json!("-56"), MARKET_CAP_SCALE).unwrap(), 5_600_000_000);
        assert_eq!(scaled_magnitude(&Value::Null, MARKET_CAP_SCALE).unwrap(), 0);
    }
}
