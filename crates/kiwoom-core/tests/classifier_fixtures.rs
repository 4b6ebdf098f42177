//! 실제/합성 종목명 픽스처에 대한 보통주 판별 고정 테스트.
//!
//! 휴리스틱이 바뀌면 이 목록이 먼저 깨지도록 판정 결과를 고정합니다.

use kiwoom_core::classifier::{exclusion_reason, Exclusion};
use kiwoom_core::{filter_instruments, is_common_stock, Instrument};
use proptest::prelude::*;

/// (종목명, 회사분류명, 보통주 여부)
const FIXTURES: &[(&str, &str, bool)] = &[
    // 보통주
    ("삼성전자", "", true),
    ("SK하이닉스", "", true),
    ("NAVER", "", true),
    ("카카오", "", true),
    ("현대차", "", true),
    ("기아", "", true),
    ("LG에너지솔루션", "", true),
    ("셀트리온", "", true),
    ("POSCO홀딩스", "", true),
    ("에코프로비엠", "", true),
    ("HLB", "", true),
    ("알테오젠", "", true),
    // 우선주
    ("삼성전자우", "", false),
    ("현대차2우B", "", false),
    ("현대차3우B", "", false),
    ("LG생활건강우", "", false),
    ("대신증권우선주", "", false),
    // 회사 분류명
    ("교보12호", "스팩", false),
    ("제이알글로벌", "리츠", false),
    ("ESR켄달스퀘어", "REIT", false),
    // 브랜드
    ("KODEX 200", "", false),
    ("TIGER 차이나전기차SOLACTIVE", "", false),
    ("ARIRANG 고배당주", "", false),
    ("KBSTAR 200", "", false),
    ("RISE 2차전지TOP10", "", false),
    // 토큰
    ("미래에셋 레버리지 원유선물혼합 ETN(H)", "", false),
    ("신한 인버스 달러 선물", "", false),
    ("맥쿼리인프라", "부동산투자", true),
    ("한화 국채 3년", "", false),
    ("NH 골드 현물", "", true),
    // 단일 글자 토큰으로 인한 알려진 오탐
    ("우리금융지주", "", false),
    ("기업은행", "", false),
    ("엔씨소프트", "", false),
];

#[test]
fn fixtures_are_stable() {
    for (name, class, expected) in FIXTURES {
        assert_eq!(
            is_common_stock(name, class),
            *expected,
            "name={name} class={class} reason={:?}",
            exclusion_reason(name, class)
        );
    }
}

#[test]
fn preferred_markers_always_excluded() {
    for name in ["삼성전자우", "현대차2우B", "LG화학우", "두산우", "한화3우B", "CJ4우C"] {
        assert!(!is_common_stock(name, ""), "{name}");
        assert_eq!(exclusion_reason(name, ""), Some(Exclusion::PreferredShare));
    }
}

#[test]
fn invalid_codes_are_dropped_regardless_of_name() {
    let items = ["12345", "1234567", "12A456", "", "00593O"]
        .into_iter()
        .map(|code| Instrument::new(code, "삼성전자", ""))
        .collect();

    assert!(filter_instruments(items).is_empty());
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "삼성전자", "현대차2우B", "KODEX 200", "NAVER", "신한 2X 테크", "카카오", " 셀트리온 ",
    ])
    .prop_map(str::to_string)
}

fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{6}",
        "[0-9]{5}",
        "[0-9A-Z]{6}",
        " [0-9]{6}",
    ]
}

proptest! {
    #[test]
    fn filter_is_idempotent(
        entries in prop::collection::vec((code_strategy(), name_strategy(), prop::sample::select(vec!["", "ETF", "스팩"])), 0..20)
    ) {
        let items: Vec<Instrument> = entries
            .into_iter()
            .map(|(code, name, class)| Instrument::new(code, name, class))
            .collect();

        let once = filter_instruments(items);
        let twice = filter_instruments(once.clone());
        prop_assert_eq!(once, twice);
    }
}
