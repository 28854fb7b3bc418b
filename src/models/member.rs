//! Library member (student) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::contains_ignore_case;

/// Member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// School-issued identifier, unique across members
    pub student_id: String,
    pub grade: String,
    /// Encoded photo, stored as sent
    pub picture_base64: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Member create / full update request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemberInput {
    pub name: String,
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub student_id: String,
    pub grade: String,
    #[serde(default)]
    pub picture_base64: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Member search query
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct MemberQuery {
    /// Matched against name, student ID and email
    pub q: Option<String>,
    pub grade: Option<String>,
}

impl Member {
    pub fn new(input: MemberInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            student_id: input.student_id,
            grade: input.grade,
            picture_base64: input.picture_base64,
            email: input.email,
            phone: input.phone,
            created_at: now,
        }
    }

    pub fn apply_update(&mut self, input: &MemberInput) {
        self.name = input.name.clone();
        self.student_id = input.student_id.clone();
        self.grade = input.grade.clone();
        self.picture_base64 = input.picture_base64.clone();
        self.email = input.email.clone();
        self.phone = input.phone.clone();
    }
}

impl MemberQuery {
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }

    pub fn grade(&self) -> Option<&str> {
        self.grade.as_deref().filter(|g| !g.is_empty())
    }

    pub fn matches(&self, member: &Member) -> bool {
        if let Some(q) = self.text() {
            let hit = contains_ignore_case(&member.name, q)
                || contains_ignore_case(&member.student_id, q)
                || member
                    .email
                    .as_deref()
                    .is_some_and(|email| contains_ignore_case(email, q));
            if !hit {
                return false;
            }
        }
        self.grade()
            .map_or(true, |grade| contains_ignore_case(&member.grade, grade))
    }
}
