//! 일별 스냅샷 수집 통합 테스트.

use async_trait::async_trait;
use chrono::NaiveDate;
use kiwoom_collector::modules::{collect_daily_snapshot, SnapshotOptions};
use kiwoom_collector::CollectorError;
use kiwoom_connector::testing::{RecordingPacer, ScriptedTransport};
use kiwoom_connector::{
    HttpResponse, KiwoomClient, KiwoomConfig, KiwoomError, MemoryTokenStore, TokenStore,
};
use kiwoom_core::{Market, PriceUnit};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn query_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
}

fn options(markets: Vec<Market>) -> SnapshotOptions {
    SnapshotOptions {
        markets,
        query_date: Some(query_date()),
        price_unit: PriceUnit::Quantity,
        per_code_delay: Duration::from_millis(120),
    }
}

fn client(transport: ScriptedTransport, pacer: Arc<RecordingPacer>) -> KiwoomClient {
    let config = Arc::new(KiwoomConfig::new("https://api.example", "app", "secret"));
    let record = json!({"token": "cached"}).to_string();
    let store = Arc::new(MemoryTokenStore::new().with_entry("k", &record, 3600));
    KiwoomClient::new(config, Arc::new(transport), store, "k").with_pacer(pacer)
}

fn daily_body(close: &str) -> serde_json::Value {
    json!({"daly_stkpc": [{
        "date": "20250110",
        "open_pric": "+70100",
        "high_pric": "71000",
        "low_pric": "-69800",
        "close_pric": close,
        "trde_qty": "12,345"
    }]})
}

#[tokio::test]
async fn test_collects_only_common_stock() {
    let transport = ScriptedTransport::new()
        .respond(
            "ka10099",
            vec![HttpResponse::ok_json(&json!({"list": [
                {"code": "005930", "name": "삼성전자", "companyClassName": ""},
                {"code": "069500", "name": "KODEX 200", "companyClassName": ""},
            ]}))],
        )
        .handle("ka10086", |req| {
            assert_eq!(req.body["stk_cd"], "005930");
            assert_eq!(req.body["qry_dt"], "20250110");
            assert_eq!(req.body["indc_tp"], "0");
            Ok(HttpResponse::ok_json(&daily_body("70500")))
        })
        .respond(
            "ka10001",
            vec![HttpResponse::ok_json(&json!({
                "stk_nm": "삼성전자", "flo_stk": "5,969,783", "mac": "4349332"
            }))],
        );
    let pacer = Arc::new(RecordingPacer::new());
    let client = client(transport, pacer.clone());

    let report = collect_daily_snapshot(&client, &options(vec![Market::Kospi]))
        .await
        .unwrap();

    assert_eq!(report.query_date, query_date());
    assert_eq!(report.rows.len(), 1);
    assert!(report.failures.is_empty());

    let row = &report.rows[0];
    assert_eq!(row.code, "005930");
    assert_eq!(row.date_key(), "20250110");
    assert_eq!(
        (row.open, row.high, row.low, row.close, row.volume),
        (70_100, 71_000, 69_800, 70_500, 12_345)
    );
    assert_eq!(row.listed_shares, 5_969_783_000);
    assert_eq!(row.market_cap, 434_933_200_000_000);
    assert_eq!(row.name, "삼성전자");

    assert_eq!(report.stats.total, 1);
    assert_eq!(report.stats.success, 1);

    // 리스트 조회 후 150ms, 종목 후 120ms
    assert_eq!(
        pacer.pauses(),
        vec![Duration::from_millis(150), Duration::from_millis(120)]
    );
}

#[tokio::test]
async fn test_no_data_and_failures_are_isolated() {
    let transport = ScriptedTransport::new()
        .respond(
            "ka10099",
            vec![HttpResponse::ok_json(&json!({"list": [
                {"code": "000001", "name": "무자료", "companyClassName": ""},
                {"code": "000002", "name": "실패종목", "companyClassName": ""},
                {"code": "000003", "name": "정상종목", "companyClassName": ""},
            ]}))],
        )
        .handle("ka10086", |req| {
            let response = match req.body["stk_cd"].as_str() {
                Some("000001") => HttpResponse::ok_json(&json!({"daly_stkpc": []})),
                Some("000002") => HttpResponse::new(400, r#"{"return_msg":"bad request"}"#),
                _ => HttpResponse::ok_json(&daily_body("1000")),
            };
            Ok(response)
        })
        .respond(
            "ka10001",
            vec![HttpResponse::ok_json(&json!({"flo_stk": "10", "mac": "1"}))],
        );
    let pacer = Arc::new(RecordingPacer::new());
    let client = client(transport, pacer.clone());

    let report = collect_daily_snapshot(&client, &options(vec![Market::Kosdaq]))
        .await
        .unwrap();

    let codes: Vec<_> = report.rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["000003"]);
    // 기본정보에 종목명이 없으면 리스트 이름 사용
    assert_eq!(report.rows[0].name, "정상종목");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "000002");
    assert!(report.failures[0].error.contains("HTTP 400"));

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.success, 1);
    assert_eq!(report.stats.empty, 1);
    assert_eq!(report.stats.errors, 1);

    // 실패/무자료 종목 뒤에도 대기
    assert_eq!(pacer.pauses().len(), 1 + 3);
}

#[tokio::test]
async fn test_unparseable_number_is_code_failure() {
    let transport = ScriptedTransport::new()
        .respond(
            "ka10099",
            vec![HttpResponse::ok_json(&json!({"list": [
                {"code": "000660", "name": "SK하이닉스", "companyClassName": ""},
            ]}))],
        )
        .respond("ka10086", vec![HttpResponse::ok_json(&daily_body("N/A"))])
        .respond("ka10001", vec![HttpResponse::ok_json(&json!({"flo_stk": "1", "mac": "1"}))]);
    let client = client(transport, Arc::new(RecordingPacer::new()));

    let report = collect_daily_snapshot(&client, &options(vec![Market::Kospi]))
        .await
        .unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.failures[0].code, "000660");
}

#[tokio::test]
async fn test_listing_failure_aborts_batch() {
    let transport = ScriptedTransport::new()
        .respond("ka10099", vec![HttpResponse::new(403, "forbidden")]);
    let client = client(transport, Arc::new(RecordingPacer::new()));

    let err = collect_daily_snapshot(&client, &options(vec![Market::Kospi]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 403"));
}

/// 처음 `reads`번만 토큰을 돌려주고 이후에는 비어 있는 캐시 (만료/유실 흉내).
struct ExpiringStore {
    reads: usize,
    gets: AtomicUsize,
}

#[async_trait]
impl TokenStore for ExpiringStore {
    async fn get(&self, _key: &str) -> kiwoom_connector::Result<Option<String>> {
        let n = self.gets.fetch_add(1, Ordering::SeqCst);
        Ok((n < self.reads).then(|| json!({"token": "cached"}).to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> kiwoom_connector::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_token_loss_mid_run_aborts_batch() {
    let list: Vec<_> = (1..=5)
        .map(|i| json!({"code": format!("00000{}", i), "name": "종목", "companyClassName": ""}))
        .collect();
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond("ka10099", vec![HttpResponse::ok_json(&json!({ "list": list }))])
            .respond("ka10086", vec![HttpResponse::ok_json(&daily_body("1000"))])
            .respond("ka10001", vec![HttpResponse::ok_json(&json!({"flo_stk": "1", "mac": "1"}))])
            .respond(
                "/oauth2/token",
                vec![HttpResponse::new(401, r#"{"return_msg":"invalid appkey"}"#)],
            ),
    );
    let config = Arc::new(KiwoomConfig::new("https://api.example", "app", "secret"));
    // 리스트 1회 + 첫 종목 일별주가/기본정보 2회
    let store = Arc::new(ExpiringStore {
        reads: 3,
        gets: AtomicUsize::new(0),
    });
    let client = KiwoomClient::new(config, transport.clone(), store, "k")
        .with_pacer(Arc::new(RecordingPacer::new()));

    let err = collect_daily_snapshot(&client, &options(vec![Market::Kospi]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CollectorError::Api(KiwoomError::TokenIssuance(_))
    ));
    // 발급은 한 번만 시도하고 남은 종목은 호출하지 않음
    assert_eq!(transport.count("/oauth2/token"), 1);
    assert_eq!(transport.count("ka10086"), 1);
    assert_eq!(transport.count("ka10001"), 1);
}
