//! HTTP client for the narrative classification API

use super::aggregate;
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, Judgment, Recommendation};
use crate::observability::ConsoleMetrics;
use crate::status::base_url;
use crate::text;
use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Default timeout for one analysis request
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum bytes of a response body kept for diagnostics
pub const MAX_ERROR_BODY_BYTES: usize = 2048;

/// Configuration for the analysis client
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Backend API base URL
    pub backend_url: Url,
    pub timeout: Duration,
}

impl AnalysisConfig {
    pub fn new(backend_url: &str) -> Result<Self> {
        Ok(Self {
            backend_url: base_url(backend_url).context("Invalid backend URL")?,
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    narrative: &'a str,
}

// Wire types: the remote schema is loose, so optional pieces default here
// and `into_model` enforces the invariants.

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    recommendations: Vec<WireRecommendation>,
}

#[derive(Debug, Deserialize)]
struct WireRecommendation {
    code: String,
    title: String,
    #[serde(default)]
    description: String,
    score: f64,
    #[serde(default)]
    judgments: Option<Vec<WireJudgment>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireJudgment {
    case_name: String,
    #[serde(default)]
    synopsis: String,
}

impl WireRecommendation {
    fn into_model(self) -> Recommendation {
        let score = if self.score.is_nan() {
            0.0
        } else {
            self.score.clamp(0.0, 1.0)
        };

        Recommendation {
            code: self.code,
            title: self.title,
            description: self.description,
            score,
            judgments: self
                .judgments
                .unwrap_or_default()
                .into_iter()
                .map(|j| Judgment {
                    case_name: j.case_name,
                    synopsis: j.synopsis,
                })
                .collect(),
        }
    }
}

/// Client for `POST /api/analyze`
pub struct AnalysisClient {
    client: Client,
    endpoint: Url,
    config: AnalysisConfig,
    metrics: ConsoleMetrics,
}

impl AnalysisClient {
    /// Create a new analysis client
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        let endpoint = config
            .backend_url
            .join("api/analyze")
            .context("Invalid analysis endpoint")?;

        Ok(Self {
            client,
            endpoint,
            config,
            metrics: ConsoleMetrics::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Analyze a narrative with the configured timeout
    pub async fn analyze(&self, narrative: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_timeout(narrative, self.config.timeout).await
    }

    /// Analyze a narrative, giving up after `timeout`
    pub async fn analyze_with_timeout(
        &self,
        narrative: &str,
        timeout: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        if narrative.trim().is_empty() {
            self.metrics.count_analysis("validation");
            return Err(AnalysisError::Validation(
                "narrative must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let outcome = self.submit(narrative, timeout).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(result) => {
                self.metrics.record_analysis("ok", elapsed);
                info!(
                    event = "analysis_completed",
                    narrative_chars = narrative.chars().count(),
                    sections = result.summary.section_count,
                    judgments = result.summary.total_judgments,
                    mean_confidence = ?result.summary.mean_confidence,
                    duration_secs = elapsed,
                    "Narrative analyzed"
                );
            }
            Err(e) => {
                self.metrics.record_analysis(e.kind(), elapsed);
                warn!(
                    event = "analysis_failed",
                    kind = e.kind(),
                    error = %e,
                    duration_secs = elapsed,
                    "Narrative analysis failed"
                );
            }
        }

        outcome
    }

    async fn submit(
        &self,
        narrative: &str,
        timeout: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(timeout)
            .json(&AnalyzeRequest { narrative })
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_bounded(response, MAX_ERROR_BODY_BYTES)
                .await
                .map_err(|e| self.transport_error(e, timeout))?;
            return Err(AnalysisError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        let parsed: AnalyzeResponse =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Malformed {
                status: status.as_u16(),
                reason: e.to_string(),
                body: text::truncate(&body, MAX_ERROR_BODY_BYTES),
            })?;

        let recommendations: Vec<Recommendation> = parsed
            .recommendations
            .into_iter()
            .map(WireRecommendation::into_model)
            .collect();
        let summary = aggregate(&recommendations);

        Ok(AnalysisResult {
            recommendations,
            summary,
        })
    }

    fn transport_error(&self, error: reqwest::Error, timeout: Duration) -> AnalysisError {
        if error.is_timeout() {
            AnalysisError::Timeout(timeout.as_secs_f64().ceil() as u64)
        } else {
            AnalysisError::Transport {
                url: self.endpoint.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

/// Read at most `limit` bytes of a response body, chunk by chunk
async fn read_bounded(mut response: Response, limit: usize) -> reqwest::Result<String> {
    let mut bytes = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response.chunk().await? {
        let room = limit - bytes.len();
        if chunk.len() > room {
            bytes.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        bytes.extend_from_slice(&chunk);
    }

    let body = String::from_utf8_lossy(&bytes).into_owned();
    Ok(if truncated {
        format!("{}… [truncated]", body)
    } else {
        body
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const NARRATIVE: &str = "A stole jewelry from a house";

    fn client_for(url: &str) -> AnalysisClient {
        AnalysisClient::new(AnalysisConfig::new(url).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_join() {
        let client = client_for("http://localhost:5000");
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:5000/api/analyze"
        );
    }

    #[tokio::test]
    async fn test_empty_narrative_rejected_without_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url());
        for narrative in ["", "   \n\t"] {
            let err = client.analyze(narrative).await.unwrap_err();
            assert!(matches!(err, AnalysisError::Validation(_)));
            assert_eq!(err.kind(), "validation");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_score_clamped_to_unit_interval() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .match_body(Matcher::Json(json!({ "narrative": NARRATIVE })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "recommendations": [{
                        "code": "IPC 379",
                        "title": "Punishment for theft",
                        "description": "Whoever commits theft shall be punished",
                        "score": 1.5,
                        "judgments": [{ "caseName": "K.N. Mehra v. State of Rajasthan", "synopsis": "Theft requires dishonest intention" }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client_for(&server.url()).analyze(NARRATIVE).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].score, 1.0);
        assert_eq!(
            result.recommendations[0].judgments[0].case_name,
            "K.N. Mehra v. State of Rajasthan"
        );
        assert_eq!(result.summary.section_count, 1);
        assert_eq!(result.summary.mean_confidence, Some(1.0));
        assert_eq!(result.summary.total_judgments, 1);
    }

    #[tokio::test]
    async fn test_negative_score_clamped_and_missing_judgments_defaulted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(
                json!({
                    "recommendations": [
                        { "code": "IPC 323", "title": "Voluntarily causing hurt", "score": -0.2 },
                        { "code": "IPC 506", "title": "Criminal intimidation", "description": "", "score": 0.4, "judgments": null }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client_for(&server.url()).analyze(NARRATIVE).await.unwrap();

        assert_eq!(result.recommendations[0].score, 0.0);
        assert!(result.recommendations[0].judgments.is_empty());
        assert_eq!(result.recommendations[0].description, "");
        assert!(result.recommendations[1].judgments.is_empty());
        assert_eq!(result.summary.total_judgments, 0);
    }

    #[tokio::test]
    async fn test_ranking_order_preserved() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(
                json!({
                    "recommendations": [
                        { "code": "IPC 420", "title": "Cheating", "score": 0.3, "judgments": [] },
                        { "code": "IPC 468", "title": "Forgery for cheating", "score": 0.9, "judgments": [] },
                        { "code": "IPC 471", "title": "Using forged document", "score": 0.6, "judgments": [] }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client_for(&server.url()).analyze(NARRATIVE).await.unwrap();
        let codes: Vec<_> = result.recommendations.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["IPC 420", "IPC 468", "IPC 471"]);
    }

    #[tokio::test]
    async fn test_no_recommendations() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let result = client_for(&server.url()).analyze(NARRATIVE).await.unwrap();
        assert!(result.recommendations.is_empty());
        assert_eq!(result.summary.mean_confidence, None);
    }

    #[tokio::test]
    async fn test_non_200_returns_remote_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(500)
            .with_body(r#"{"success":false,"error":"Error analyzing narrative"}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).analyze(NARRATIVE).await.unwrap_err();
        match err {
            AnalysisError::Remote { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("Error analyzing narrative"));
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_body_is_bounded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(502)
            .with_body("x".repeat(10 * MAX_ERROR_BODY_BYTES))
            .create_async()
            .await;

        let err = client_for(&server.url()).analyze(NARRATIVE).await.unwrap_err();
        match err {
            AnalysisError::Remote { body, .. } => {
                assert!(body.starts_with("xxxx"));
                assert!(body.ends_with("… [truncated]"));
                assert!(body.len() <= MAX_ERROR_BODY_BYTES + "… [truncated]".len());
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(r#"{"recommendations": [{"title": "missing code"}]}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).analyze(NARRATIVE).await.unwrap_err();
        assert_eq!(err.kind(), "malformed");
        match err {
            AnalysisError::Malformed { status, body, .. } => {
                assert_eq!(status, 200);
                assert!(body.contains("missing code"));
            }
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client_for(&format!("http://127.0.0.1:{}", port));
        let err = client.analyze(NARRATIVE).await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = client_for(&format!("http://{}", addr));
        let err = client
            .analyze_with_timeout(NARRATIVE, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(1)));
    }
}
