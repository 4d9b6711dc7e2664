//! Post repository.

use std::sync::Arc;

use crate::entities::{Category, Post, PostCategory, PostReaction, ReactionKind};
use crate::entities::{category, post, post_category, post_reaction};
use forum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Post repository for database operations.
///
/// Also owns the post↔category link table, mirroring the fact that a
/// post's categories only ever change together with the post itself.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))
    }

    /// Check whether a post exists.
    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all posts (newest first).
    pub async fn find_all(&self) -> AppResult<Vec<post::Model>> {
        Post::find()
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find posts by IDs (newest first).
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Post::find()
            .filter(post::Column::Id.is_in(ids.to_vec()))
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get posts created by a user (newest first).
    pub async fn find_by_author(&self, user_id: i64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get posts carrying at least one of the given categories (newest
    /// first). An empty filter matches everything.
    pub async fn find_filtered(&self, category_ids: &[i64]) -> AppResult<Vec<post::Model>> {
        if category_ids.is_empty() {
            return self.find_all().await;
        }

        let links = PostCategory::find()
            .filter(post_category::Column::CategoryId.is_in(category_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<i64> = links.into_iter().map(|l| l.post_id).collect();
        self.find_by_ids(&ids).await
    }

    /// Get posts the user currently has a "like" edge on (newest first).
    pub async fn find_liked_by(&self, user_id: i64) -> AppResult<Vec<post::Model>> {
        let reactions = PostReaction::find()
            .filter(post_reaction::Column::UserId.eq(user_id))
            .filter(post_reaction::Column::Kind.eq(ReactionKind::Like))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<i64> = reactions.into_iter().map(|r| r.post_id).collect();
        self.find_by_ids(&ids).await
    }

    /// Attach categories to a post.
    pub async fn insert_categories(&self, post_id: i64, category_ids: &[i64]) -> AppResult<()> {
        if category_ids.is_empty() {
            return Ok(());
        }

        let models = category_ids.iter().map(|category_id| post_category::ActiveModel {
            post_id: Set(post_id),
            category_id: Set(*category_id),
        });

        PostCategory::insert_many(models)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the categories attached to a post, ascending by category ID.
    pub async fn categories_for(&self, post_id: i64) -> AppResult<Vec<category::Model>> {
        let links = PostCategory::find()
            .filter(post_category::Column::PostId.eq(post_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<i64> = links.into_iter().map(|l| l.category_id).collect();
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids))
            .order_by_asc(category::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
