//! 보통주 판별 휴리스틱.
//!
//! 종목 리스트에는 ETF, ETN, 리츠, 스팩, 우선주, 파생형 상품이 섞여 있습니다.
//! 아래 규칙을 순서대로 평가해 하나라도 걸리면 보통주가 아닌 것으로 봅니다.
//!
//! 1. 우선주 패턴 (`삼성전자우`, `현대차2우B`, `우선주`)
//! 2. 회사 분류명의 펀드/신탁 표식 (스팩, 리츠, ETF, ETN)
//! 3. ETF/ETN 운용사 브랜드 (TIGER, KODEX, ...)
//! 4. 비보통주 토큰 (파생, 레버리지, 통화/원자재/채권, 지수명, 헤지)
//! 5. 레버리지/인버스/선물/커버드콜/합성 등을 잡는 광역 정규식
//!
//! 정확한 분류가 아니라 휴리스틱입니다. 한 글자 토큰(`우`, `금`, `은`, `엔`)
//! 때문에 일부 보통주도 제외되지만, 같은 입력에는 항상 같은 결과를 냅니다.
//! 대소문자 비교는 로케일과 무관한 `str::to_uppercase`를 사용합니다.

use crate::types::Instrument;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// ETF/ETN 운용사 브랜드.
pub const ETF_BRANDS: &[&str] = &[
    "TIGER", "KODEX", "KOSEF", "KBSTAR", "ARIRANG", "HANARO", "SOL", "ACE", "TIMEFOLIO", "TREX",
    "KINDEX", "RISE", "FOCUS", "PLUS", "UNICORN", "1Q", "QV", "KIWOOM", "KB발해",
];

/// 종목명에 포함되면 보통주가 아닌 것으로 보는 토큰.
pub const NON_STOCK_TOKENS: &[&str] = &[
    "ETF", "ETN", "ETC", "리츠", "REIT", "스팩", "SPAC", "우선",
    "선물", "인버스", "레버리지", "커버드콜", "합성",
    "(H)", "H)", "환헤지", "헤지",
    "S&P", "NASDAQ", "NIKKEI", "DAX", "EURO", "KOSPI200", "코스피200", "코스피", "200", "100",
    "미국", "액티브", "BNK", "부동산",
    "국채", "채권", "단기채", "중기채", "장기채",
    "원유", "WTI", "브렌트", "금", "은", "구리", "철강", "곡물",
    "달러", "USD", "엔", "JPY", "유로", "EUR", "위안", "CNY",
];

/// 회사 분류명에 포함되면 제외하는 표식.
pub const COMPANY_CLASS_MARKERS: &[&str] = &["스팩", "SPAC", "리츠", "REIT", "ETF", "ETN"];

const PREFERRED_PATTERN: &str = r"(?i)(?:\d*우[B-C]?|우선|우선주)";
const NON_STOCK_PATTERN: &str =
    r"(?i)(?:\b[23]X\b|레버리지|인버스|선물|커버드콜|합성|\(H\)|ETF|ETN|REIT|리츠|SPAC|스팩|우선)";

fn preferred_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 상수 패턴이므로 컴파일 실패하지 않음 (테스트로 검증)
    RE.get_or_init(|| Regex::new(PREFERRED_PATTERN).expect("preferred-share pattern"))
}

fn non_stock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NON_STOCK_PATTERN).expect("non-stock pattern"))
}

/// 제외 사유. 평가 순서대로 정의되어 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclusion {
    /// 우선주 패턴
    PreferredShare,
    /// 회사 분류명 표식
    CompanyClass,
    /// 운용사 브랜드
    EtfBrand,
    /// 비보통주 토큰
    NonStockToken,
    /// 광역 정규식
    NonStockPattern,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::PreferredShare => write!(f, "preferred_share"),
            Exclusion::CompanyClass => write!(f, "company_class"),
            Exclusion::EtfBrand => write!(f, "etf_brand"),
            Exclusion::NonStockToken => write!(f, "non_stock_token"),
            Exclusion::NonStockPattern => write!(f, "non_stock_pattern"),
        }
    }
}

/// 첫 번째로 걸리는 제외 사유를 반환합니다. 보통주면 `None`.
pub fn exclusion_reason(name: &str, company_class: &str) -> Option<Exclusion> {
    let n = name.to_uppercase();
    let c = company_class.to_uppercase();

    if preferred_regex().is_match(&n) {
        return Some(Exclusion::PreferredShare);
    }

    if COMPANY_CLASS_MARKERS.iter().any(|m| c.contains(m)) {
        return Some(Exclusion::CompanyClass);
    }

    if ETF_BRANDS.iter().any(|b| n.contains(&b.to_uppercase())) {
        return Some(Exclusion::EtfBrand);
    }

    if NON_STOCK_TOKENS.iter().any(|t| n.contains(&t.to_uppercase())) {
        return Some(Exclusion::NonStockToken);
    }

    if non_stock_regex().is_match(&n) {
        return Some(Exclusion::NonStockPattern);
    }

    None
}

/// 보통주가 아닌지 판별합니다.
pub fn is_non_common_stock(name: &str, company_class: &str) -> bool {
    exclusion_reason(name, company_class).is_some()
}

/// 보통주인지 판별합니다.
pub fn is_common_stock(name: &str, company_class: &str) -> bool {
    !is_non_common_stock(name, company_class)
}

/// 정확히 6자리 ASCII 숫자인 종목코드인지 확인합니다.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// 종목 리스트에서 보통주만 남깁니다.
///
/// 입력 순서를 유지하며, 코드/이름/분류명의 앞뒤 공백을 제거한 항목을 반환합니다.
pub fn filter_instruments(items: Vec<Instrument>) -> Vec<Instrument> {
    let total = items.len();

    let kept: Vec<Instrument> = items
        .into_iter()
        .map(|item| Instrument {
            code: item.code.trim().to_string(),
            name: item.name.trim().to_string(),
            company_class: item.company_class.trim().to_string(),
        })
        .filter(|item| is_valid_code(&item.code))
        .filter(|item| match exclusion_reason(&item.name, &item.company_class) {
            Some(reason) => {
                tracing::trace!(code = %item.code, name = %item.name, %reason, "종목 제외");
                false
            }
            None => true,
        })
        .collect();

    tracing::debug!(total, kept = kept.len(), "종목 필터 적용");
    kept
}
