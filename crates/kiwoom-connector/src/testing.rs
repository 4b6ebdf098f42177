//! 테스트용 전송 계층과 대기 구현.
//!
//! 네트워크와 실제 대기 없이 재시도, 토큰 캐시, 수집 파이프라인을 검증할 때 씁니다.

use crate::error::Result;
use crate::request::Pacer;
use crate::transport::{HttpResponse, HttpTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type Handler = Arc<dyn Fn(&RecordedRequest) -> Result<HttpResponse> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 기록된 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// 요청 URL
    pub url: String,
    /// 라우팅 키 (`api-id` 헤더, 없으면 URL 경로)
    pub route: String,
    /// 요청 헤더
    pub headers: Vec<(String, String)>,
    /// 요청 본문
    pub body: Value,
}

impl RecordedRequest {
    /// 헤더 값 조회.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

enum Route {
    /// 순서대로 반환, 마지막 응답은 반복
    Queue(VecDeque<HttpResponse>),
    Handler(Handler),
}

/// 라우트별로 미리 정한 응답을 돌려주는 전송 계층.
///
/// 라우팅 키는 TR 요청이면 `api-id` 헤더, 토큰 요청이면 URL 경로입니다.
/// 등록되지 않은 라우트는 404를 돌려줍니다.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    /// 빈 전송 계층 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 응답 시퀀스 등록.
    pub fn respond(self, route: &str, responses: Vec<HttpResponse>) -> Self {
        lock(&self.routes).insert(route.to_string(), Route::Queue(responses.into()));
        self
    }

    /// 요청마다 호출되는 핸들러 등록.
    pub fn handle<F>(self, route: &str, handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        lock(&self.routes).insert(route.to_string(), Route::Handler(Arc::new(handler)));
        self
    }

    /// 지금까지 받은 요청.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// 라우트별 요청 수.
    pub fn count(&self, route: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.route == route).count()
    }
}

fn url_path(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match without_scheme.find('/') {
        Some(idx) => without_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
        _timeout: Duration,
    ) -> Result<HttpResponse> {
        let route = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("api-id"))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| url_path(url));

        let request = RecordedRequest {
            url: url.to_string(),
            route: route.clone(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
            body: body.clone(),
        };
        lock(&self.requests).push(request.clone());

        let handler = {
            let mut routes = lock(&self.routes);
            match routes.get_mut(&route) {
                Some(Route::Queue(queue)) => {
                    let response = if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    };
                    return Ok(response.unwrap_or_else(|| HttpResponse::new(404, "")));
                }
                Some(Route::Handler(handler)) => Arc::clone(handler),
                None => return Ok(HttpResponse::new(404, "no route")),
            }
        };

        handler(&request)
    }
}

/// 대기 시간을 기록만 하고 즉시 반환하는 대기 구현.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    /// 새 기록기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록된 대기 시간.
    pub fn pauses(&self) -> Vec<Duration> {
        lock(&self.pauses).clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        lock(&self.pauses).push(duration);
    }
}

/// 토큰 발급 성공 응답.
pub fn token_response(token: &str, expires_dt: &str) -> HttpResponse {
    HttpResponse::ok_json(&json!({
        "expires_dt": expires_dt,
        "token_type": "bearer",
        "token": token,
        "return_code": 0,
        "return_msg": "정상적으로 처리되었습니다",
    }))
}
