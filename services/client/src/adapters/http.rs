//! services/client/src/adapters/http.rs
//!
//! This module contains the adapter for the remote learning service.
//! It implements the `LearningService` port from the `core` crate over JSON/HTTP,
//! mapping every outcome onto the port's closed error taxonomy.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use zhidao_core::domain::{
    ActivityAction, Content, ContentCollection, ContentKind, CreatedGoal,
    CrossDisciplinaryRecommendation, DeepQuestion, Exploration, GoalPriority, LearningActivity,
    LearningPath, MAX_PROGRESS,
};
use zhidao_core::ports::{LearningService, RemoteError, RemoteResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LearningService` against the `/api` HTTP collaborator.
#[derive(Clone)]
pub struct HttpLearningService {
    client: Client,
    base_url: String,
}

impl HttpLearningService {
    /// Creates a new `HttpLearningService`. The base URL is only validated per request.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| RemoteError::InvalidRequest(format!("{raw}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> RemoteResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(request_error)?;
        let body = read_body(response).await?;
        decode(&body)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> RemoteResult<Bytes> {
        let url = self.endpoint(path)?;
        let payload =
            serde_json::to_vec(body).map_err(|e| RemoteError::EncodingFailed(e.to_string()))?;
        debug!(%url, bytes = payload.len(), "POST");
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(request_error)?;
        read_body(response).await
    }
}

fn request_error(e: reqwest::Error) -> RemoteError {
    if e.is_builder() {
        RemoteError::InvalidRequest(e.to_string())
    } else {
        RemoteError::TransportFailure(e.to_string())
    }
}

async fn read_body(response: Response) -> RemoteResult<Bytes> {
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::ServerError(status.as_u16()));
    }
    response
        .bytes()
        .await
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> RemoteResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RemoteError::NoData);
    }
    serde_json::from_slice(body).map_err(|e| RemoteError::DecodingFailed(e.to_string()))
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGoalRequest<'a> {
    user_id: &'a str,
    goal: &'a str,
    timeframe: &'a str,
    priority: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGoalResponse {
    goal_id: String,
    learning_path: LearningPathRecord,
}

#[derive(Deserialize)]
struct LearningPathRecord {
    foundational: Vec<String>,
    intermediate: Vec<String>,
    advanced: Vec<String>,
    projects: Vec<String>,
}
impl LearningPathRecord {
    fn to_domain(self) -> LearningPath {
        LearningPath {
            foundational: self.foundational,
            intermediate: self.intermediate,
            advanced: self.advanced,
            projects: self.projects,
        }
    }
}

#[derive(Deserialize)]
struct ContentCollectionRecord {
    topic: String,
    content: Vec<ContentRecord>,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentKindRecord {
    Academic,
    Synthetic,
    UserGenerated,
    News,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentRecord {
    id: String,
    title: String,
    summary: String,
    authors: Vec<String>,
    year: Option<i32>,
    #[serde(rename = "type")]
    kind: ContentKindRecord,
    tags: Vec<String>,
    relevance_score: f64,
}
impl ContentRecord {
    fn to_domain(self) -> Content {
        Content {
            id: self.id,
            title: self.title,
            summary: self.summary,
            authors: self.authors,
            year: self.year,
            kind: match self.kind {
                ContentKindRecord::Academic => ContentKind::Academic,
                ContentKindRecord::Synthetic => ContentKind::Synthetic,
                ContentKindRecord::UserGenerated => ContentKind::UserGenerated,
                ContentKindRecord::News => ContentKind::News,
            },
            tags: self.tags,
            relevance_score: self.relevance_score.clamp(0.0, 1.0),
        }
    }
}

#[derive(Deserialize)]
struct QuestionsResponse {
    questions: Vec<DeepQuestionRecord>,
}

#[derive(Deserialize)]
struct DeepQuestionRecord {
    id: String,
    question: String,
    category: String,
    difficulty: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsResponse {
    recommendations: Vec<RecommendationRecord>,
    exploration_percentage: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRecord {
    id: String,
    area: String,
    connection: String,
    value_proposition: String,
    exploration_difficulty: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRequest<'a> {
    user_id: &'a str,
    content_id: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRequest<'a> {
    user_id: &'a str,
    content_id: &'a str,
    action: &'a str,
    timestamp: String,
}

//=========================================================================================
// `LearningService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LearningService for HttpLearningService {
    async fn create_goal(
        &self,
        user_id: &str,
        goal: &str,
        timeframe: &str,
        priority: GoalPriority,
    ) -> RemoteResult<CreatedGoal> {
        let request = CreateGoalRequest {
            user_id,
            goal,
            timeframe,
            priority: priority.as_str(),
        };
        let body = self.post("goals", &request).await?;
        let response: CreateGoalResponse = decode(&body)?;

        Ok(CreatedGoal {
            goal_id: response.goal_id,
            learning_path: response.learning_path.to_domain(),
        })
    }

    async fn fetch_content(&self, topic: &str) -> RemoteResult<ContentCollection> {
        let record: ContentCollectionRecord = self.get("content", &[("topic", topic)]).await?;

        Ok(ContentCollection {
            topic: record.topic,
            content: record.content.into_iter().map(|c| c.to_domain()).collect(),
            fetched_at: record.timestamp,
        })
    }

    async fn fetch_deep_questions(&self, topic: &str) -> RemoteResult<Vec<DeepQuestion>> {
        let response: QuestionsResponse = self.get("questions", &[("topic", topic)]).await?;

        Ok(response
            .questions
            .into_iter()
            .map(|q| DeepQuestion {
                id: q.id,
                question: q.question,
                category: q.category,
                difficulty: q.difficulty,
            })
            .collect())
    }

    async fn fetch_cross_disciplinary_recommendations(
        &self,
        user_id: &str,
        topic: &str,
    ) -> RemoteResult<Exploration> {
        let response: RecommendationsResponse = self
            .get(
                "recommendations/cross-disciplinary",
                &[("userId", user_id), ("currentTopic", topic)],
            )
            .await?;

        let recommendations = response
            .recommendations
            .into_iter()
            .map(|r| CrossDisciplinaryRecommendation {
                id: r.id,
                area: r.area,
                connection: r.connection,
                value_proposition: r.value_proposition,
                exploration_difficulty: r.exploration_difficulty,
            })
            .collect();
        let exploration_percentage =
            response.exploration_percentage.clamp(0, i64::from(MAX_PROGRESS)) as u8;

        Ok(Exploration {
            recommendations,
            exploration_percentage,
        })
    }

    async fn fetch_learning_path(&self, user_id: &str, topic: &str) -> RemoteResult<LearningPath> {
        let record: LearningPathRecord = self
            .get("learning-path", &[("userId", user_id), ("topic", topic)])
            .await?;
        Ok(record.to_domain())
    }

    async fn record_progress(
        &self,
        user_id: &str,
        content_id: &str,
        action: ActivityAction,
        duration: Option<Duration>,
    ) -> RemoteResult<()> {
        let request = ProgressRequest {
            user_id,
            content_id,
            action: action.as_str(),
            duration: duration.map(|d| d.as_secs_f64()),
        };
        self.post("progress", &request).await?;
        Ok(())
    }

    async fn record_activity(&self, user_id: &str, activity: &LearningActivity) -> RemoteResult<()> {
        let request = ActivityRequest {
            user_id,
            content_id: &activity.content_id,
            action: activity.action.as_str(),
            timestamp: activity.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        self.post("activities", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_no_data() {
        let result: RemoteResult<LearningPathRecord> = decode(b"  \n");
        assert!(matches!(result, Err(RemoteError::NoData)));
    }

    #[test]
    fn content_record_accepts_missing_year() {
        let record: ContentRecord = decode(
            br#"{"id":"c1","title":"t","summary":"s","authors":[],"type":"userGenerated","tags":["x"],"relevanceScore":1.7}"#,
        )
        .unwrap();
        let content = record.to_domain();
        assert_eq!(content.year, None);
        assert_eq!(content.kind, ContentKind::UserGenerated);
        assert_eq!(content.relevance_score, 1.0);
    }

    #[test]
    fn progress_request_omits_missing_duration() {
        let request = ProgressRequest {
            user_id: "u1",
            content_id: "c1",
            action: ActivityAction::Viewed.as_str(),
            duration: None,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"userId":"u1","contentId":"c1","action":"viewed"}"#
        );
    }

    #[test]
    fn endpoint_rejects_relative_base() {
        let service = HttpLearningService::new("not a url").unwrap();
        assert!(matches!(
            service.endpoint("goals"),
            Err(RemoteError::InvalidRequest(_))
        ));
    }
}
