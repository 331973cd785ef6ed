use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use simanbas_common::models::{
    AnalysisResult, Comment, Question, QuestionOptionStats, Roster, StudentScores, TestSession,
    Token, User,
};
use simanbas_common::{ApiConfig, Result, SimanbasError};
use std::time::Duration;
use uuid::Uuid;

use crate::query::SummaryFilter;
use crate::session::Session;

/// REST client for the SiManBaS backend. The auth session is explicit state:
/// it is attached to requests only when present and replaced only by `login`
/// or `refresh`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Option<Session>) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(SimanbasError::Config("api.base_url is empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let session = match session {
            Some(s) if !s.matches(&base_url) => {
                tracing::warn!("stored session is for {}, not {base_url}; ignoring it", s.base_url);
                None
            }
            other => other,
        };
        Ok(Self { http, base_url, session })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// OAuth2 password grant. The new token replaces any current session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session> {
        let req = self
            .http
            .post(self.endpoint("/auth/login"))
            .form(&[("username", username), ("password", password)]);
        let token: Token = self.send(req).await?;
        let session = Session::from_token(&self.base_url, username, token);
        tracing::info!(user = username, "logged in to {}", self.base_url);
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Fetches a fresh token for the current session's user.
    pub async fn refresh(&mut self, password: &str) -> Result<Session> {
        let username = match &self.session {
            Some(s) => s.username.clone(),
            None => return Err(SimanbasError::Auth("not logged in".into())),
        };
        self.login(&username, password).await
    }

    pub async fn me(&self) -> Result<User> {
        self.get_json("/users/me", &[]).await
    }

    pub async fn analysis_summary(&self, filter: &SummaryFilter) -> Result<Vec<AnalysisResult>> {
        let records: Vec<AnalysisResult> =
            self.get_json("/analysis/summary-stats", &filter.to_query()).await?;
        tracing::debug!(count = records.len(), "fetched analysis summary");
        Ok(records)
    }

    pub async fn question_analysis(&self, question_id: Uuid) -> Result<AnalysisResult> {
        self.get_json(&format!("/analysis/questions/{question_id}"), &[]).await
    }

    /// Asks the backend to (re)compute a question's indices. Total scores are
    /// needed for a full discrimination index.
    pub async fn trigger_analysis(
        &self,
        question_id: Uuid,
        scores: Option<&StudentScores>,
    ) -> Result<AnalysisResult> {
        let mut req = self.http.post(self.endpoint(&format!("/analysis/questions/{question_id}")));
        if let Some(s) = scores {
            req = req.json(s);
        }
        self.send(self.authorize(req)).await
    }

    pub async fn question(&self, question_id: Uuid) -> Result<Question> {
        self.get_json(&format!("/questions/{question_id}"), &[]).await
    }

    pub async fn question_option_stats(&self, question_id: Uuid) -> Result<QuestionOptionStats> {
        self.get_json(&format!("/questions/{question_id}/option-stats"), &[]).await
    }

    pub async fn subjects(&self) -> Result<Vec<String>> {
        self.get_json("/meta/subjects", &[]).await
    }

    pub async fn topics(&self, subject: Option<&str>) -> Result<Vec<String>> {
        let query: Vec<(&str, String)> =
            subject.map(|s| vec![("subject", s.to_owned())]).unwrap_or_default();
        self.get_json("/meta/topics", &query).await
    }

    pub async fn test_sessions(&self) -> Result<Vec<TestSession>> {
        self.get_json("/test-sessions/", &[]).await
    }

    pub async fn rosters(&self) -> Result<Vec<Roster>> {
        self.get_json("/rosters/", &[]).await
    }

    pub async fn comments(&self, question_id: Uuid) -> Result<Vec<Comment>> {
        self.get_json(&format!("/questions/{question_id}/comments"), &[]).await
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(s) => req.header(reqwest::header::AUTHORIZATION, s.authorization()),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let req = self.http.get(self.endpoint(path)).query(query);
        self.send(self.authorize(req)).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::debug!(status = status.as_u16(), "request failed: {message}");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SimanbasError::Auth(message),
                _ => SimanbasError::Api { status: status.as_u16(), message },
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Human-readable message from a FastAPI error body: a string `detail`, or the
/// first validation entry as `loc -> loc: msg`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        match v.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(serde_json::Value::Array(items)) => {
                if let Some(first) = items.first() {
                    let loc = first
                        .get("loc")
                        .and_then(|l| l.as_array())
                        .map(|parts| {
                            parts
                                .iter()
                                .map(|p| match p {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect::<Vec<_>>()
                                .join(" -> ")
                        })
                        .unwrap_or_default();
                    let msg = first.get("msg").and_then(|m| m.as_str()).unwrap_or("invalid request");
                    return if loc.is_empty() { msg.to_owned() } else { format!("{loc}: {msg}") };
                }
            }
            _ => {}
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const QID: &str = "6f1c2a4e-8d0b-4b7e-9a51-3c2d7e9f1a00";
    const UID: &str = "0b8e4c1d-2f3a-4e5b-8c6d-7e8f9a0b1c2d";

    /// Answers a single request with `status` and `body`; the handle yields
    /// the raw request text.
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            String::from_utf8_lossy(&buf).into_owned()
        });
        (url, handle)
    }

    fn logged_in(url: &str) -> ApiClient {
        let session = Session::from_token(
            url,
            "guru",
            Token { access_token: "tok123".into(), token_type: "bearer".into() },
        );
        ApiClient::new(&config(url), Some(session)).unwrap()
    }

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "id": UID, "email": "guru@example.com", "username": "guru", "role": "teacher",
            "created_at": "2025-06-01T00:00:00", "updated_at": "2025-06-01T00:00:00"
        })
    }

    fn config(url: &str) -> ApiConfig {
        ApiConfig { base_url: url.into(), timeout_secs: 2 }
    }

    #[test]
    fn string_detail() {
        let msg = error_message(StatusCode::NOT_FOUND, r#"{"detail":"Question with id 1 not found."}"#);
        assert_eq!(msg, "Question with id 1 not found.");
    }

    #[test]
    fn validation_detail() {
        let body = r#"{"detail":[{"loc":["query","limit",0],"msg":"value is not a valid integer","type":"type_error"}]}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "query -> limit -> 0: value is not a valid integer"
        );
    }

    #[test]
    fn plain_and_empty_bodies() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(error_message(StatusCode::INTERNAL_SERVER_ERROR, ""), "Internal Server Error");
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let c = ApiClient::new(&config("http://localhost:8000/api/v1/"), None).unwrap();
        assert_eq!(c.endpoint("/analysis/summary-stats"), "http://localhost:8000/api/v1/analysis/summary-stats");
        assert_eq!(c.endpoint("users/me"), "http://localhost:8000/api/v1/users/me");
    }

    #[test]
    fn empty_base_url_is_config_error() {
        assert!(matches!(ApiClient::new(&config("/"), None), Err(SimanbasError::Config(_))));
    }

    #[test]
    fn foreign_session_is_dropped() {
        let s = Session::from_token(
            "http://other.example/api/v1",
            "t",
            Token { access_token: "x".into(), token_type: "bearer".into() },
        );
        let c = ApiClient::new(&config("http://localhost:8000/api/v1"), Some(s.clone())).unwrap();
        assert!(c.session().is_none());
        let c = ApiClient::new(&config("http://other.example/api/v1/"), Some(s)).unwrap();
        assert!(c.session().is_some());
    }

    #[tokio::test]
    async fn refresh_needs_a_session() {
        let mut c = ApiClient::new(&config("http://127.0.0.1:9/api/v1"), None).unwrap();
        assert!(matches!(c.refresh("pw").await, Err(SimanbasError::Auth(_))));
    }

    #[tokio::test]
    async fn login_posts_form_and_keeps_session() {
        let (url, req) = serve_once("200 OK", r#"{"access_token":"abc","token_type":"bearer"}"#.into()).await;
        let mut c = ApiClient::new(&config(&url), None).unwrap();
        let session = c.login("guru", "s3cret").await.unwrap();
        let raw = req.await.unwrap();
        assert!(raw.starts_with("POST /api/v1/auth/login "));
        assert!(raw.contains("username=guru&password=s3cret"));
        assert_eq!(session.authorization(), "Bearer abc");
        assert_eq!(c.session().map(|s| s.username.as_str()), Some("guru"));
    }

    #[tokio::test]
    async fn trigger_analysis_sends_scores_with_token() {
        let body = serde_json::json!({
            "id": UID, "question_id": QID, "difficulty_index_p_value": 0.55,
            "discrimination_index": 0.41, "responses_analyzed_count": 30,
            "last_analyzed_at": "2025-06-08T07:47:00"
        });
        let (url, req) = serve_once("200 OK", body.to_string()).await;
        let c = logged_in(&url);
        let scores = StudentScores { scores: BTreeMap::from([("S001".to_owned(), 90.0)]) };
        let id: Uuid = QID.parse().unwrap();
        let result = c.trigger_analysis(id, Some(&scores)).await.unwrap();
        assert_eq!(result.discrimination_index, Some(0.41));
        let raw = req.await.unwrap();
        assert!(raw.starts_with(&format!("POST /api/v1/analysis/questions/{QID} ")));
        assert!(raw.to_lowercase().contains("authorization: bearer tok123"));
        assert!(raw.ends_with(r#"{"scores":{"S001":90.0}}"#));
    }

    #[tokio::test]
    async fn question_and_its_analysis() {
        let body = serde_json::json!({
            "id": QID, "content": "2 + 2 = ?", "question_type": "multiple_choice",
            "answer_options": [{"id": UID, "option_text": "4", "is_correct": true}],
            "created_by_user_id": UID,
            "created_at": "2025-06-08T07:47:00", "updated_at": "2025-06-08T07:47:00"
        });
        let (url, req) = serve_once("200 OK", body.to_string()).await;
        let q = logged_in(&url).question(QID.parse().unwrap()).await.unwrap();
        assert_eq!(q.kind.correct_option().map(|o| o.option_text.as_str()), Some("4"));
        assert!(req.await.unwrap().starts_with(&format!("GET /api/v1/questions/{QID} ")));

        let (url, _req) = serve_once("404 Not Found", r#"{"detail":"Analysis not found"}"#.into()).await;
        let err = logged_in(&url).question_analysis(QID.parse().unwrap()).await.unwrap_err();
        match err {
            SimanbasError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Analysis not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn comments_carry_their_owner() {
        let body = serde_json::json!([{
            "id": UID, "content": "Option B is ambiguous", "owner_id": UID, "question_id": QID,
            "created_at": "2025-06-08T07:47:00", "updated_at": "2025-06-08T07:47:00Z",
            "owner": user_json()
        }]);
        let (url, req) = serve_once("200 OK", body.to_string()).await;
        let comments = logged_in(&url).comments(QID.parse().unwrap()).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].owner.display_name(), "guru");
        assert!(req.await.unwrap().starts_with(&format!("GET /api/v1/questions/{QID}/comments ")));
    }

    #[tokio::test]
    async fn meta_lists() {
        let (url, req) = serve_once("200 OK", r#"["Math","Physics"]"#.into()).await;
        assert_eq!(logged_in(&url).subjects().await.unwrap(), vec!["Math", "Physics"]);
        assert!(req.await.unwrap().starts_with("GET /api/v1/meta/subjects "));

        let (url, req) = serve_once("200 OK", r#"["Algebra"]"#.into()).await;
        assert_eq!(logged_in(&url).topics(Some("Math")).await.unwrap(), vec!["Algebra"]);
        assert!(req.await.unwrap().starts_with("GET /api/v1/meta/topics?subject=Math "));
    }

    #[tokio::test]
    async fn sessions_and_rosters() {
        let owner = UID;
        let body = serde_json::json!([{ "id": QID, "name": "UTS Ganjil", "owner_id": owner, "questions": [] }]);
        let (url, _req) = serve_once("200 OK", body.to_string()).await;
        let sessions = logged_in(&url).test_sessions().await.unwrap();
        assert_eq!(sessions[0].name, "UTS Ganjil");
        assert!(sessions[0].roster_id.is_none());

        let body = serde_json::json!([{
            "id": QID, "name": "XI IPA 1", "owner_id": owner,
            "students": [{ "id": UID, "student_identifier": "S001" }]
        }]);
        let (url, req) = serve_once("200 OK", body.to_string()).await;
        let rosters = logged_in(&url).rosters().await.unwrap();
        assert_eq!(rosters[0].students[0].student_identifier, "S001");
        assert!(req.await.unwrap().starts_with("GET /api/v1/rosters/ "));
    }

    #[tokio::test]
    async fn rejected_token_is_auth_error() {
        let (url, _req) = serve_once("401 Unauthorized", r#"{"detail":"Could not validate credentials"}"#.into()).await;
        let err = logged_in(&url).me().await.unwrap_err();
        assert!(matches!(err, SimanbasError::Auth(m) if m == "Could not validate credentials"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_http_error() {
        // port 9 (discard) is closed on test machines
        let c = ApiClient::new(&config("http://127.0.0.1:9/api/v1"), None).unwrap();
        let err = c.analysis_summary(&SummaryFilter::default()).await.unwrap_err();
        assert!(matches!(err, SimanbasError::Http(_)));
    }
}
