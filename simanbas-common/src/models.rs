//! Typed records for the SiManBaS REST resources.
//!
//! Optional backend fields are `Option`, unknown fields are ignored, and
//! timestamps accept both offset-qualified and naive (UTC) ISO-8601 strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub(crate) mod timestamp {
    use super::*;

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: Uuid,
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Per-type payload of a question, keyed by the wire `question_type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        #[serde(default)]
        answer_options: Vec<AnswerOption>,
    },
    ShortAnswer {
        #[serde(default)]
        correct_answer_text: Option<String>,
    },
    Essay,
}

impl QuestionKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::ShortAnswer { .. } => "short_answer",
            QuestionKind::Essay => "essay",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "Multiple choice",
            QuestionKind::ShortAnswer { .. } => "Short answer",
            QuestionKind::Essay => "Essay",
        }
    }

    pub fn correct_option(&self) -> Option<&AnswerOption> {
        match self {
            QuestionKind::MultipleChoice { answer_options } => {
                answer_options.iter().find(|o| o.is_correct)
            }
            QuestionKind::ShortAnswer { .. } | QuestionKind::Essay => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub content: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub initial_difficulty_estimate: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub created_by_user_id: Uuid,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub creator: Option<User>,
}

/// The slice of a question the summary endpoint joins onto each result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub content: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub question_id: Uuid,
    #[serde(default)]
    pub test_session_identifier: Option<String>,
    #[serde(default)]
    pub difficulty_index_p_value: Option<f64>,
    #[serde(default)]
    pub discrimination_index: Option<f64>,
    #[serde(default)]
    pub responses_analyzed_count: Option<u32>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub last_analyzed_at: DateTime<Utc>,
    #[serde(default)]
    pub question: Option<QuestionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionStat {
    pub option_id: Uuid,
    pub option_text: String,
    pub is_correct: bool,
    pub selection_count: u32,
    pub selection_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOptionStats {
    pub question_id: Uuid,
    pub question_content: String,
    pub question_type: String,
    pub total_responses_for_question: u32,
    pub options_stats: Vec<OptionStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: Uuid,
    #[serde(default)]
    pub roster_id: Option<Uuid>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub student_identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: Uuid,
    #[serde(default)]
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub owner_id: Uuid,
    pub question_id: Uuid,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    pub owner: User,
}

/// Body of `POST /analysis/questions/{id}`: student identifier → total score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentScores {
    pub scores: BTreeMap<String, f64>,
}
