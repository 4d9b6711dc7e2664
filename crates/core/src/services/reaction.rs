//! Reaction toggle engine.
//!
//! Posts and comments share one toggle state machine: per (object, user)
//! pair the state is one of neutral, like, or dislike, and a request moves
//! it with `next(state, requested) = neutral if state == requested else
//! requested`. The machine is written once against the [`ReactionStore`]
//! capability; only the repository calls differ between the two object
//! kinds.

use async_trait::async_trait;
use forum_common::{AppError, AppResult};
use forum_db::entities::ReactionKind;
use forum_db::repositories::{
    CommentReactionRepository, CommentRepository, PostReactionRepository, PostRepository,
};
use serde::Serialize;
use tracing::debug;

/// Derived like or dislike aggregate for one object.
///
/// Recomputed on every read, never persisted; `count` always equals
/// `users.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactionAggregate {
    /// Number of users currently reacting this way.
    pub count: usize,
    /// The reacting users, ascending by ID.
    pub users: Vec<i64>,
}

impl ReactionAggregate {
    fn from_users(users: Vec<i64>) -> Self {
        Self {
            count: users.len(),
            users,
        }
    }
}

/// Storage capability for one reactable object kind.
///
/// Implementations address a concrete pair of repositories; the engine
/// never needs to know whether the object is a post or a comment.
#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Object kind label used in trace events.
    fn object_kind(&self) -> &'static str;

    /// Check whether the target object exists.
    async fn object_exists(&self, object_id: i64) -> AppResult<bool>;

    /// Current reaction kind for (object, user); `None` is the neutral
    /// state.
    async fn find_kind(&self, object_id: i64, user_id: i64) -> AppResult<Option<ReactionKind>>;

    /// Insert a new reaction edge.
    async fn insert(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()>;

    /// Flip an existing edge to a new kind in place.
    async fn update_kind(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()>;

    /// Delete the edge for (object, user).
    async fn remove(&self, object_id: i64, user_id: i64) -> AppResult<()>;

    /// Users currently reacting with `kind`, ascending by user ID.
    async fn users_by_kind(&self, object_id: i64, kind: ReactionKind) -> AppResult<Vec<i64>>;
}

/// Reaction storage addressed at posts.
#[derive(Clone)]
pub struct PostReactions {
    post_repo: PostRepository,
    reaction_repo: PostReactionRepository,
}

impl PostReactions {
    /// Create a post-addressed reaction store.
    #[must_use]
    pub const fn new(post_repo: PostRepository, reaction_repo: PostReactionRepository) -> Self {
        Self {
            post_repo,
            reaction_repo,
        }
    }
}

#[async_trait]
impl ReactionStore for PostReactions {
    fn object_kind(&self) -> &'static str {
        "post"
    }

    async fn object_exists(&self, object_id: i64) -> AppResult<bool> {
        self.post_repo.exists(object_id).await
    }

    async fn find_kind(&self, object_id: i64, user_id: i64) -> AppResult<Option<ReactionKind>> {
        Ok(self
            .reaction_repo
            .find_by_post_and_user(object_id, user_id)
            .await?
            .map(|r| r.kind))
    }

    async fn insert(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reaction_repo.create(object_id, user_id, kind).await?;
        Ok(())
    }

    async fn update_kind(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reaction_repo
            .update_kind(object_id, user_id, kind)
            .await
    }

    async fn remove(&self, object_id: i64, user_id: i64) -> AppResult<()> {
        self.reaction_repo
            .delete_by_post_and_user(object_id, user_id)
            .await
    }

    async fn users_by_kind(&self, object_id: i64, kind: ReactionKind) -> AppResult<Vec<i64>> {
        self.reaction_repo.users_by_kind(object_id, kind).await
    }
}

/// Reaction storage addressed at comments.
#[derive(Clone)]
pub struct CommentReactions {
    comment_repo: CommentRepository,
    reaction_repo: CommentReactionRepository,
}

impl CommentReactions {
    /// Create a comment-addressed reaction store.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        reaction_repo: CommentReactionRepository,
    ) -> Self {
        Self {
            comment_repo,
            reaction_repo,
        }
    }
}

#[async_trait]
impl ReactionStore for CommentReactions {
    fn object_kind(&self) -> &'static str {
        "comment"
    }

    async fn object_exists(&self, object_id: i64) -> AppResult<bool> {
        self.comment_repo.exists(object_id).await
    }

    async fn find_kind(&self, object_id: i64, user_id: i64) -> AppResult<Option<ReactionKind>> {
        Ok(self
            .reaction_repo
            .find_by_comment_and_user(object_id, user_id)
            .await?
            .map(|r| r.kind))
    }

    async fn insert(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reaction_repo.create(object_id, user_id, kind).await?;
        Ok(())
    }

    async fn update_kind(&self, object_id: i64, user_id: i64, kind: ReactionKind) -> AppResult<()> {
        self.reaction_repo
            .update_kind(object_id, user_id, kind)
            .await
    }

    async fn remove(&self, object_id: i64, user_id: i64) -> AppResult<()> {
        self.reaction_repo
            .delete_by_comment_and_user(object_id, user_id)
            .await
    }

    async fn users_by_kind(&self, object_id: i64, kind: ReactionKind) -> AppResult<Vec<i64>> {
        self.reaction_repo.users_by_kind(object_id, kind).await
    }
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService<S> {
    store: S,
}

impl<S: ReactionStore> ReactionService<S> {
    /// Create a new reaction service over a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Toggle the viewer's reaction on an object.
    ///
    /// Missing objects fail with [`AppError::InvalidObject`]; repository
    /// failures propagate unchanged. No aggregate is returned, callers
    /// re-derive aggregates on the next read.
    pub async fn react(
        &self,
        object_id: i64,
        user_id: i64,
        requested: ReactionKind,
    ) -> AppResult<()> {
        if !self.store.object_exists(object_id).await? {
            return Err(AppError::InvalidObject(object_id));
        }

        match self.store.find_kind(object_id, user_id).await? {
            None => {
                debug!(
                    object_kind = self.store.object_kind(),
                    object_id,
                    user_id,
                    kind = ?requested,
                    "inserting reaction edge"
                );
                self.store.insert(object_id, user_id, requested).await
            }
            Some(current) if current == requested => {
                debug!(
                    object_kind = self.store.object_kind(),
                    object_id,
                    user_id,
                    kind = ?current,
                    "removing reaction edge"
                );
                self.store.remove(object_id, user_id).await
            }
            Some(current) => {
                debug!(
                    object_kind = self.store.object_kind(),
                    object_id,
                    user_id,
                    from = ?current,
                    to = ?requested,
                    "flipping reaction edge"
                );
                self.store.update_kind(object_id, user_id, requested).await
            }
        }
    }

    /// Compute the aggregate for one reaction kind on an object.
    pub async fn aggregate(
        &self,
        object_id: i64,
        kind: ReactionKind,
    ) -> AppResult<ReactionAggregate> {
        let users = self.store.users_by_kind(object_id, kind).await?;
        Ok(ReactionAggregate::from_users(users))
    }

    /// Compute the like and dislike aggregates for an object.
    pub async fn aggregates(
        &self,
        object_id: i64,
    ) -> AppResult<(ReactionAggregate, ReactionAggregate)> {
        let likes = self.aggregate(object_id, ReactionKind::Like).await?;
        let dislikes = self.aggregate(object_id, ReactionKind::Dislike).await?;
        Ok((likes, dislikes))
    }

    /// The viewer's own reaction on an object; absence is the neutral
    /// state, not an error.
    pub async fn viewer_reaction(
        &self,
        object_id: i64,
        user_id: i64,
    ) -> AppResult<Option<ReactionKind>> {
        self.store.find_kind(object_id, user_id).await
    }
}
