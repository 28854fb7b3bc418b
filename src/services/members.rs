//! Member directory service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Member, MemberInput},
    repository::{DeleteOutcome, MemberWrite, Repository, LIST_LIMIT},
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

fn written(result: MemberWrite) -> AppResult<Member> {
    match result {
        MemberWrite::Written(member) => Ok(member),
        MemberWrite::NotFound => Err(AppError::NotFound("Member not found".to_string())),
        MemberWrite::DuplicateStudentId => {
            Err(AppError::Conflict("Student ID already exists".to_string()))
        }
    }
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.repository.list_members(LIST_LIMIT).await
    }

    pub async fn get_member(&self, id: &str) -> AppResult<Member> {
        self.repository
            .get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn create_member(&self, input: MemberInput) -> AppResult<Member> {
        input.validate()?;

        let member = Member::new(input, Utc::now());
        let member = written(self.repository.insert_member(&member).await?)?;

        tracing::info!(
            "Members: created member id={} student_id={}",
            member.id,
            member.student_id
        );
        Ok(member)
    }

    /// Replace a member's fields. The student ID is only re-checked for
    /// uniqueness when it changes.
    pub async fn update_member(&self, id: &str, input: MemberInput) -> AppResult<Member> {
        input.validate()?;
        written(self.repository.update_member(id, &input).await?)
    }

    pub async fn delete_member(&self, id: &str) -> AppResult<()> {
        match self.repository.delete_member(id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Members: deleted member id={}", id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AppError::NotFound("Member not found".to_string())),
            DeleteOutcome::ActiveBorrow => {
                tracing::warn!("Members: refused to delete borrowing member id={}", id);
                Err(AppError::Conflict(
                    "Cannot delete member who has borrowed books".to_string(),
                ))
            }
        }
    }
}
