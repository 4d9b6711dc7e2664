//! Post service.

use forum_common::{AppError, AppResult};
use forum_db::entities::{ReactionKind, category, post};
use forum_db::repositories::{
    CategoryRepository, CommentRepository, PostReactionRepository, PostRepository,
};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::reaction::{PostReactions, ReactionAggregate, ReactionService};

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    #[validate(length(min = 1, max = 5))]
    pub category_ids: Vec<i64>,
}

/// A post annotated for presentation: aggregates, comment count, category
/// labels, and the viewer's own reaction.
///
/// All annotation fields are derived views recomputed per request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    /// Category names, ascending by category ID.
    pub categories: Vec<String>,
    pub likes: ReactionAggregate,
    pub dislikes: ReactionAggregate,
    pub comment_count: u64,
    /// `None` is the neutral state.
    pub viewer_reaction: Option<ReactionKind>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    category_repo: CategoryRepository,
    reactions: ReactionService<PostReactions>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        category_repo: CategoryRepository,
        reaction_repo: PostReactionRepository,
    ) -> Self {
        let reactions = ReactionService::new(PostReactions::new(post_repo.clone(), reaction_repo));
        Self {
            post_repo,
            comment_repo,
            category_repo,
            reactions,
        }
    }

    /// Create a new post with its categories.
    pub async fn create(&self, author_id: i64, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let title = input.title.trim();
        let body = input.body.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }
        if body.is_empty() {
            return Err(AppError::Validation("Body must not be blank".to_string()));
        }

        let mut category_ids = input.category_ids.clone();
        category_ids.sort_unstable();
        category_ids.dedup();

        let known = self.category_repo.find_by_ids(&category_ids).await?;
        if known.len() != category_ids.len() {
            return Err(AppError::BadRequest(
                "One or more category ids do not exist".to_string(),
            ));
        }

        let created = self
            .post_repo
            .create(post::ActiveModel {
                user_id: Set(author_id),
                title: Set(title.to_string()),
                body: Set(body.to_string()),
                created_at: Set(chrono::Utc::now().into()),
                ..Default::default()
            })
            .await?;

        self.post_repo
            .insert_categories(created.id, &category_ids)
            .await?;

        Ok(created)
    }

    /// Get a post by ID, annotated for the viewer.
    pub async fn get_by_id(&self, id: i64, viewer_id: i64) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(id).await?;
        self.annotate(post, viewer_id).await
    }

    /// Get all posts, annotated for the viewer (newest first).
    pub async fn get_all(&self, viewer_id: i64) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.find_all().await?;
        self.annotate_all(posts, viewer_id).await
    }

    /// Get posts carrying at least one of the given categories, annotated
    /// for the viewer (newest first).
    pub async fn get_filtered(
        &self,
        category_ids: &[i64],
        viewer_id: i64,
    ) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.find_filtered(category_ids).await?;
        self.annotate_all(posts, viewer_id).await
    }

    /// Get posts created by a user, annotated for the viewer (newest
    /// first).
    pub async fn get_created_by(&self, user_id: i64, viewer_id: i64) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.find_by_author(user_id).await?;
        self.annotate_all(posts, viewer_id).await
    }

    /// Get posts the user currently likes, annotated for the viewer
    /// (newest first).
    pub async fn get_liked_by(&self, user_id: i64, viewer_id: i64) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.find_liked_by(user_id).await?;
        self.annotate_all(posts, viewer_id).await
    }

    /// Toggle the viewer's reaction on a post.
    pub async fn react(&self, post_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reactions.react(post_id, user_id, kind).await
    }

    /// List all categories, ascending by ID.
    pub async fn categories(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.find_all().await
    }

    async fn annotate_all(
        &self,
        posts: Vec<post::Model>,
        viewer_id: i64,
    ) -> AppResult<Vec<PostView>> {
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.annotate(post, viewer_id).await?);
        }
        Ok(views)
    }

    async fn annotate(&self, post: post::Model, viewer_id: i64) -> AppResult<PostView> {
        let comment_count = self.comment_repo.count_by_post(post.id).await?;
        let (likes, dislikes) = self.reactions.aggregates(post.id).await?;
        let categories = self
            .post_repo
            .categories_for(post.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        let viewer_reaction = self.reactions.viewer_reaction(post.id, viewer_id).await?;

        Ok(PostView {
            id: post.id,
            author_id: post.user_id,
            title: post.title,
            body: post.body,
            created_at: post.created_at,
            categories,
            likes,
            dislikes,
            comment_count,
            viewer_reaction,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forum_db::entities::{post_category, post_reaction};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_post(id: i64, user_id: i64, title: &str) -> post::Model {
        post::Model {
            id,
            user_id,
            title: title.to_string(),
            body: "Test body".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_category(id: i64, name: &str) -> category::Model {
        category::Model {
            id,
            name: name.to_string(),
        }
    }

    fn count_result(n: i64) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        vec![maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> PostService {
        PostService::new(
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            PostReactionRepository::new(db),
        )
    }

    fn create_input(title: &str, body: &str, category_ids: Vec<i64>) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            body: body.to_string(),
            category_ids,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_annotates_post() {
        let like = post_reaction::Model {
            id: 1,
            post_id: 10,
            user_id: 100,
            kind: ReactionKind::Like,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // post lookup
                .append_query_results([[create_test_post(10, 1, "Hello")]])
                // comment count
                .append_query_results([count_result(2)])
                // like edges
                .append_query_results([[like]])
                // dislike edges
                .append_query_results([Vec::<post_reaction::Model>::new()])
                // category links (none)
                .append_query_results([Vec::<post_category::Model>::new()])
                // viewer's own reaction (none)
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .into_connection(),
        );

        let view = service(db).get_by_id(10, 999).await.unwrap();

        assert_eq!(view.comment_count, 2);
        assert_eq!(view.likes.count, 1);
        assert_eq!(view.likes.users, vec![100]);
        assert_eq!(view.dislikes.count, 0);
        assert!(view.categories.is_empty());
        // Absence of a viewer reaction is the neutral state, not an error.
        assert!(view.viewer_reaction.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let result = service(db).get_by_id(99, 1).await;

        match result {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, 99),
            other => panic!("Expected PostNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_all_annotates_each_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_post(2, 1, "Second"),
                    create_test_post(1, 1, "First"),
                ]])
                // post 2 annotation
                .append_query_results([count_result(0)])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .append_query_results([Vec::<post_category::Model>::new()])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                // post 1 annotation
                .append_query_results([count_result(0)])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .append_query_results([Vec::<post_category::Model>::new()])
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .into_connection(),
        );

        let views = service(db).get_all(5).await.unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, 2);
        assert_eq!(views[1].id, 1);
    }

    #[tokio::test]
    async fn test_create_inserts_post_and_categories() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // category existence check
                .append_query_results([[
                    create_test_category(1, "General"),
                    create_test_category(2, "Technology"),
                ]])
                // inserted post returned
                .append_query_results([[create_test_post(7, 3, "New post")]])
                // category links inserted
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let input = create_input("New post", "Some body", vec![1, 2]);
        let created = service(db).create(3, input).await.unwrap();

        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // only one of the two ids resolves
                .append_query_results([[create_test_category(1, "General")]])
                .into_connection(),
        );

        let input = create_input("Title", "Body", vec![1, 9]);
        let result = service(db).create(3, input).await;

        match result {
            Err(AppError::BadRequest(_)) => {}
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let input = create_input("   ", "Body", vec![1]);
        let result = service(db).create(3, input).await;

        match result {
            Err(AppError::Validation(_)) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_missing_categories() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let input = create_input("Title", "Body", vec![]);
        let result = service(db).create(3, input).await;

        match result {
            Err(AppError::Validation(_)) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_react_missing_post_is_invalid_object() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let result = service(db).react(42, 1, ReactionKind::Like).await;

        match result {
            Err(AppError::InvalidObject(id)) => assert_eq!(id, 42),
            other => panic!("Expected InvalidObject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_view_serializes_with_camel_case_fields() {
        let view = PostView {
            id: 1,
            author_id: 2,
            title: "T".to_string(),
            body: "B".to_string(),
            created_at: Utc::now().into(),
            categories: vec!["General".to_string()],
            likes: ReactionAggregate::default(),
            dislikes: ReactionAggregate::default(),
            comment_count: 0,
            viewer_reaction: Some(ReactionKind::Like),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["commentCount"], 0);
        assert_eq!(json["viewerReaction"], "like");
    }

    #[test]
    fn test_input_limits_rejected_by_validation() {
        // Title capped at 100 characters, categories at 5.
        let input = CreatePostInput {
            title: "x".repeat(101),
            body: "Body".to_string(),
            category_ids: vec![1; 6],
        };
        assert!(input.validate().is_err());
    }
}
