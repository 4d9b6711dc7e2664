//! Comment reaction repository.

use std::sync::Arc;

use crate::entities::{CommentReaction, ReactionKind, comment_reaction};
use forum_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Comment reaction repository for database operations.
///
/// Mirrors [`PostReactionRepository`](super::PostReactionRepository) keyed
/// by comment ID; the unique (comment, user) index serializes concurrent
/// toggles on the same pair.
#[derive(Clone)]
pub struct CommentReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentReactionRepository {
    /// Create a new comment reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by comment and user.
    pub async fn find_by_comment_and_user(
        &self,
        comment_id: i64,
        user_id: i64,
    ) -> AppResult<Option<comment_reaction::Model>> {
        CommentReaction::find()
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new reaction edge.
    pub async fn create(
        &self,
        comment_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> AppResult<comment_reaction::Model> {
        let model = comment_reaction::ActiveModel {
            comment_id: Set(comment_id),
            user_id: Set(user_id),
            kind: Set(kind),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip an existing reaction edge to a new kind in place.
    pub async fn update_kind(
        &self,
        comment_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> AppResult<()> {
        CommentReaction::update_many()
            .col_expr(comment_reaction::Column::Kind, Expr::value(kind))
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reaction edge by comment and user.
    pub async fn delete_by_comment_and_user(&self, comment_id: i64, user_id: i64) -> AppResult<()> {
        CommentReaction::delete_many()
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the users who currently react to a comment with the given kind,
    /// ascending by user ID.
    pub async fn users_by_kind(&self, comment_id: i64, kind: ReactionKind) -> AppResult<Vec<i64>> {
        let rows = CommentReaction::find()
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::Kind.eq(kind))
            .order_by_asc(comment_reaction::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_reaction(
        id: i64,
        comment_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> comment_reaction::Model {
        comment_reaction::Model {
            id,
            comment_id,
            user_id,
            kind,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_comment_and_user_found() {
        let reaction = create_test_reaction(1, 5, 100, ReactionKind::Dislike);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reaction.clone()]])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.find_by_comment_and_user(5, 100).await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, ReactionKind::Dislike);
    }

    #[tokio::test]
    async fn test_find_by_comment_and_user_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment_reaction::Model>::new()])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.find_by_comment_and_user(5, 100).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_comment_and_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.delete_by_comment_and_user(5, 100).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_users_by_kind() {
        let r1 = create_test_reaction(1, 5, 7, ReactionKind::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1]])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.users_by_kind(5, ReactionKind::Like).await.unwrap();

        assert_eq!(result, vec![7]);
    }
}
