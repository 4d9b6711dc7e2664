//! Comment service and reply-tree assembly.

use forum_common::{AppError, AppResult};
use forum_db::entities::{ReactionKind, comment};
use forum_db::repositories::{CommentReactionRepository, CommentRepository, PostRepository};
use futures::future::BoxFuture;
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::reaction::{CommentReactions, ReactionAggregate, ReactionService};

/// Input for creating a comment.
///
/// `parent_id` of `None` or `0` attaches the comment directly to the
/// post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[validate(length(min = 1, max = 3000))]
    pub body: String,
}

/// One node of an assembled reply tree: a comment annotated with its
/// aggregates, the viewer's own reaction, and its decorated replies in
/// creation order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    /// `None` for root-level comments.
    pub parent_id: Option<i64>,
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    pub likes: ReactionAggregate,
    pub dislikes: ReactionAggregate,
    /// `None` is the neutral state.
    pub viewer_reaction: Option<ReactionKind>,
    pub replies: Vec<CommentNode>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    reactions: ReactionService<CommentReactions>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        reaction_repo: CommentReactionRepository,
    ) -> Self {
        let reactions =
            ReactionService::new(CommentReactions::new(comment_repo.clone(), reaction_repo));
        Self {
            comment_repo,
            post_repo,
            reactions,
        }
    }

    /// Create a comment on a post.
    ///
    /// A non-root `parent_id` must resolve to an existing comment on the
    /// same post; a dangling or cross-post parent fails with
    /// [`AppError::InvalidParent`] and performs no insert.
    pub async fn create(
        &self,
        author_id: i64,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let body = input.body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("Body must not be blank".to_string()));
        }

        if !self.post_repo.exists(input.post_id).await? {
            return Err(AppError::InvalidObject(input.post_id));
        }

        let parent_id = input.parent_id.filter(|&p| p != 0);
        if let Some(pid) = parent_id {
            match self.comment_repo.find_by_id(pid).await? {
                Some(parent) if parent.post_id == input.post_id => {}
                _ => return Err(AppError::InvalidParent(pid)),
            }
        }

        self.comment_repo
            .create(comment::ActiveModel {
                post_id: Set(input.post_id),
                user_id: Set(author_id),
                parent_id: Set(parent_id),
                body: Set(body.to_string()),
                created_at: Set(chrono::Utc::now().into()),
                ..Default::default()
            })
            .await
    }

    /// Get a comment by ID.
    pub async fn get_by_id(&self, id: i64) -> AppResult<comment::Model> {
        self.comment_repo.get_by_id(id).await
    }

    /// Count all comments on a post, replies included.
    pub async fn count(&self, post_id: i64) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }

    /// Toggle the viewer's reaction on a comment.
    pub async fn react(&self, comment_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reactions.react(comment_id, user_id, kind).await
    }

    /// Assemble the reply tree of a post for a viewer.
    ///
    /// The frontier is the set of root-level comments in creation order;
    /// each node is decorated with its aggregates, the viewer's own
    /// reaction, and its decorated replies. Absent reactions and empty
    /// reply lists are expected, only genuine repository errors abort the
    /// fetch.
    pub async fn fetch(&self, post_id: i64, viewer_id: i64) -> AppResult<Vec<CommentNode>> {
        let roots = self.comment_repo.find_roots_by_post(post_id).await?;

        let mut tree = Vec::with_capacity(roots.len());
        for root in roots {
            tree.push(self.decorate(root, viewer_id).await?);
        }
        Ok(tree)
    }

    /// Recursively decorate a comment and its replies.
    ///
    /// A parent must exist before a reply can reference it, so the
    /// parent/child relation is acyclic and the recursion terminates at
    /// the longest reply chain actually created. No depth cap is imposed.
    fn decorate<'a>(
        &'a self,
        model: comment::Model,
        viewer_id: i64,
    ) -> BoxFuture<'a, AppResult<CommentNode>> {
        Box::pin(async move {
            let (likes, dislikes) = self.reactions.aggregates(model.id).await?;
            let children = self.comment_repo.find_by_parent(model.id).await?;
            let viewer_reaction = self.reactions.viewer_reaction(model.id, viewer_id).await?;

            let mut replies = Vec::with_capacity(children.len());
            for child in children {
                replies.push(self.decorate(child, viewer_id).await?);
            }

            Ok(CommentNode {
                id: model.id,
                post_id: model.post_id,
                author_id: model.user_id,
                parent_id: model.parent_id,
                body: model.body,
                created_at: model.created_at,
                likes,
                dislikes,
                viewer_reaction,
                replies,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forum_db::entities::{comment_reaction, post};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_comment(id: i64, post_id: i64, parent_id: Option<i64>) -> comment::Model {
        comment::Model {
            id,
            post_id,
            user_id: 100,
            parent_id,
            body: format!("comment {id}"),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_post(id: i64) -> post::Model {
        post::Model {
            id,
            user_id: 1,
            title: "Title".to_string(),
            body: "Body".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn no_reactions() -> Vec<comment_reaction::Model> {
        Vec::new()
    }

    fn no_comments() -> Vec<comment::Model> {
        Vec::new()
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> CommentService {
        CommentService::new(
            CommentRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            CommentReactionRepository::new(db),
        )
    }

    fn create_input(post_id: i64, parent_id: Option<i64>, body: &str) -> CreateCommentInput {
        CreateCommentInput {
            post_id,
            parent_id,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_preserves_depth_three_chain() {
        // C1 is a root, C2 replies to C1, C3 replies to C2.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // roots of the post
                .append_query_results([[create_test_comment(1, 10, None)]])
                // C1: likes, dislikes, replies, viewer reaction
                .append_query_results([no_reactions()])
                .append_query_results([no_reactions()])
                .append_query_results([[create_test_comment(2, 10, Some(1))]])
                .append_query_results([no_reactions()])
                // C2
                .append_query_results([no_reactions()])
                .append_query_results([no_reactions()])
                .append_query_results([[create_test_comment(3, 10, Some(2))]])
                .append_query_results([no_reactions()])
                // C3
                .append_query_results([no_reactions()])
                .append_query_results([no_reactions()])
                .append_query_results([no_comments()])
                .append_query_results([no_reactions()])
                .into_connection(),
        );

        let tree = service(db).fetch(10, 999).await.unwrap();

        assert_eq!(tree.len(), 1);
        let c1 = &tree[0];
        assert_eq!(c1.id, 1);
        assert_eq!(c1.replies.len(), 1);
        let c2 = &c1.replies[0];
        assert_eq!(c2.id, 2);
        assert_eq!(c2.parent_id, Some(1));
        assert_eq!(c2.replies.len(), 1);
        let c3 = &c2.replies[0];
        assert_eq!(c3.id, 3);
        assert!(c3.replies.is_empty());
        // No viewer reactions anywhere: neutral, never an error.
        assert!(c1.viewer_reaction.is_none());
        assert!(c3.viewer_reaction.is_none());
    }

    #[tokio::test]
    async fn test_fetch_empty_post_yields_empty_tree() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([no_comments()])
                .into_connection(),
        );

        let tree = service(db).fetch(10, 1).await.unwrap();

        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_keeps_sibling_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_comment(1, 10, None),
                    create_test_comment(2, 10, None),
                ]])
                // first root
                .append_query_results([no_reactions()])
                .append_query_results([no_reactions()])
                .append_query_results([no_comments()])
                .append_query_results([no_reactions()])
                // second root
                .append_query_results([no_reactions()])
                .append_query_results([no_reactions()])
                .append_query_results([no_comments()])
                .append_query_results([no_reactions()])
                .into_connection(),
        );

        let tree = service(db).fetch(10, 1).await.unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, 1);
        assert_eq!(tree[1].id, 2);
    }

    #[tokio::test]
    async fn test_create_root_comment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // post exists
                .append_query_results([[create_test_post(10)]])
                // inserted comment returned
                .append_query_results([[create_test_comment(5, 10, None)]])
                .into_connection(),
        );

        let created = service(db)
            .create(100, create_input(10, None, "First!"))
            .await
            .unwrap();

        assert_eq!(created.id, 5);
        assert_eq!(created.parent_id, None);
    }

    #[tokio::test]
    async fn test_create_treats_zero_parent_as_root() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(10)]])
                // no parent lookup happens; next query is the insert
                .append_query_results([[create_test_comment(6, 10, None)]])
                .into_connection(),
        );

        let created = service(db)
            .create(100, create_input(10, Some(0), "Root via legacy zero"))
            .await
            .unwrap();

        assert_eq!(created.parent_id, None);
    }

    #[tokio::test]
    async fn test_create_rejects_dangling_parent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(10)]])
                // parent lookup comes back empty
                .append_query_results([no_comments()])
                .into_connection(),
        );

        let result = service(db)
            .create(100, create_input(10, Some(77), "reply"))
            .await;

        match result {
            Err(AppError::InvalidParent(id)) => assert_eq!(id, 77),
            other => panic!("Expected InvalidParent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_parent_from_other_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(10)]])
                // parent exists but belongs to post 99
                .append_query_results([[create_test_comment(4, 99, None)]])
                .into_connection(),
        );

        let result = service(db)
            .create(100, create_input(10, Some(4), "reply"))
            .await;

        match result {
            Err(AppError::InvalidParent(id)) => assert_eq!(id, 4),
            other => panic!("Expected InvalidParent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_on_missing_post_is_invalid_object() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let result = service(db)
            .create(100, create_input(10, None, "hello"))
            .await;

        match result {
            Err(AppError::InvalidObject(id)) => assert_eq!(id, 10),
            other => panic!("Expected InvalidObject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_react_same_kind_removes_edge() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // comment exists
                .append_query_results([[create_test_comment(5, 10, None)]])
                // current edge is a like
                .append_query_results([[comment_reaction::Model {
                    id: 1,
                    comment_id: 5,
                    user_id: 100,
                    kind: ReactionKind::Like,
                    created_at: Utc::now().into(),
                }]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let result = service(db).react(5, 100, ReactionKind::Like).await;

        assert!(result.is_ok());
    }
}
