//! Kiwoom daily snapshot collector CLI.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kiwoom_collector::modules::{collect_daily_snapshot, SnapshotOptions};
use kiwoom_collector::{CollectorConfig, PgWriter, RowSink};
use kiwoom_connector::{KiwoomClient, RedisTokenStore, ReqwestTransport};
use kiwoom_core::{init_logging, parse_date, LogConfig, LogFormat, Market, PriceUnit};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "kiwoom-collector")]
#[command(about = "KRX common-stock daily snapshot collector (Kiwoom REST API)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// 일별 스냅샷 수집 후 업서트
    Collect {
        /// 대상 시장 (쉼표로 구분, 0=코스피, 10=코스닥)
        #[arg(long)]
        markets: Option<String>,

        /// 조회 일자 (YYYYMMDD, 기본: 오늘)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// 일별주가 표시 구분 (0=수량, 1=금액)
        #[arg(long)]
        price_unit: Option<PriceUnit>,

        /// 종목 간 대기 (밀리초)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// 저장 테이블
        #[arg(long)]
        table: Option<String>,

        /// 수집만 하고 저장하지 않음
        #[arg(long)]
        dry_run: bool,
    },

    /// 일봉차트 최신 1건 조회 (수정주가, JSON 출력)
    FetchLatest {
        /// 종목코드
        #[arg(long)]
        code: String,

        /// 기준 일자 (YYYYMMDD, 기본: 오늘)
        #[arg(long, value_parser = parse_date_arg)]
        base_date: Option<NaiveDate>,
    },

    /// 접근토큰 폐기 (캐시는 그대로 둠)
    RevokeToken {
        /// 폐기할 토큰
        #[arg(long)]
        token: String,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("YYYYMMDD 형식이 아닙니다: {}", s))
}

async fn build_client(config: &CollectorConfig) -> anyhow::Result<KiwoomClient> {
    config.kiwoom.validate()?;

    let store = RedisTokenStore::connect(&config.redis)
        .await
        .context("토큰 캐시 Redis 연결 실패")?;
    let transport = ReqwestTransport::new()?;

    Ok(KiwoomClient::new(
        Arc::clone(&config.kiwoom),
        Arc::new(transport),
        Arc::new(store),
        config.token_key.clone(),
    ))
}

fn rate(count: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 && count > 0 {
        format!("{:.2}", count as f64 / secs)
    } else {
        "-".to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig::with_level(&cli.log_level).with_format(cli.log_format))
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Kiwoom Daily Collector 시작");

    let config = CollectorConfig::from_env()?;

    match cli.command {
        Commands::Collect {
            markets,
            date,
            price_unit,
            delay_ms,
            table,
            dry_run,
        } => {
            let started = Instant::now();

            let mut snapshot = config.snapshot.clone();
            if let Some(raw) = markets {
                snapshot.markets = Market::parse_list(&raw)?;
                anyhow::ensure!(!snapshot.markets.is_empty(), "--markets 값이 비어 있습니다");
            }
            if let Some(unit) = price_unit {
                snapshot.price_unit = unit;
            }
            if let Some(ms) = delay_ms {
                snapshot.code_delay_ms = ms;
            }
            if let Some(table) = table {
                snapshot.table = table;
            }
            kiwoom_collector::sink::validate_table_name(&snapshot.table)?;

            // 저장 대상이면 수집 전에 연결 정보부터 확인
            let database_url = if dry_run {
                None
            } else {
                Some(config.require_database_url()?.to_string())
            };

            let client = build_client(&config).await?;

            // 1) 수집
            let options = SnapshotOptions::from_config(&snapshot).with_query_date(date);
            let report = collect_daily_snapshot(&client, &options).await?;
            report.stats.log_summary("일별 스냅샷");
            tracing::info!(
                rows = report.rows.len(),
                failures = report.failures.len(),
                query_date = %report.query_date,
                time = format!("{:.2}s", report.stats.elapsed.as_secs_f64()),
                rows_per_sec = rate(report.rows.len() as u64, report.stats.elapsed),
                "수집 완료"
            );

            // 2) 업서트
            match database_url {
                None => {
                    tracing::info!("dry-run: 저장 생략");
                    if let Some(sample) = report.rows.first() {
                        tracing::info!(
                            code = %sample.code,
                            ymd = %sample.date_key(),
                            close = sample.close,
                            market_cap = sample.market_cap,
                            listed_shares = sample.listed_shares,
                            name = %sample.name,
                            "샘플 행"
                        );
                    }
                }
                Some(url) => {
                    let upsert_started = Instant::now();
                    let writer = PgWriter::connect(&url).await?;
                    let upserted = writer
                        .upsert_daily_rows(&report.rows, &snapshot.table)
                        .await?;
                    writer.close().await;

                    let upsert_elapsed = upsert_started.elapsed();
                    tracing::info!(
                        upserted,
                        table = %snapshot.table,
                        time = format!("{:.2}s", upsert_elapsed.as_secs_f64()),
                        rows_per_sec = rate(upserted, upsert_elapsed),
                        "업서트 완료"
                    );
                }
            }

            tracing::info!(
                total = format!("{:.2}s", started.elapsed().as_secs_f64()),
                "전체 완료"
            );
        }
        Commands::FetchLatest { code, base_date } => {
            let client = build_client(&config).await?;
            let bar = client.fetch_latest_by_chart(&code, base_date).await?;
            match bar {
                Some(bar) => println!("{}", serde_json::to_string_pretty(&bar)?),
                None => {
                    tracing::warn!(code = %code, "차트 데이터 없음");
                    println!("null");
                }
            }
        }
        Commands::RevokeToken { token } => {
            let client = build_client(&config).await?;
            let body = client.revoke_token(&token).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    tracing::info!("Kiwoom Daily Collector 종료");
    Ok(())
}
