//! Post reaction repository.

use std::sync::Arc;

use crate::entities::{PostReaction, ReactionKind, post_reaction};
use forum_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Post reaction repository for database operations.
///
/// At most one row exists per (post, user) pair; the unique index created
/// by migration is what serializes concurrent toggles on the same pair.
#[derive(Clone)]
pub struct PostReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl PostReactionRepository {
    /// Create a new post reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by post and user.
    pub async fn find_by_post_and_user(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> AppResult<Option<post_reaction::Model>> {
        PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new reaction edge.
    pub async fn create(
        &self,
        post_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> AppResult<post_reaction::Model> {
        let model = post_reaction::ActiveModel {
            post_id: Set(post_id),
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
        post_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> AppResult<()> {
        PostReaction::update_many()
            .col_expr(post_reaction::Column::Kind, Expr::value(kind))
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reaction edge by post and user.
    pub async fn delete_by_post_and_user(&self, post_id: i64, user_id: i64) -> AppResult<()> {
        PostReaction::delete_many()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the users who currently react to a post with the given kind,
    /// ascending by user ID.
    pub async fn users_by_kind(&self, post_id: i64, kind: ReactionKind) -> AppResult<Vec<i64>> {
        let rows = PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::Kind.eq(kind))
            .order_by_asc(post_reaction::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }
}
