//! Create post reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostReaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostReaction::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostReaction::PostId).big_integer().not_null())
                    .col(ColumnDef::new(PostReaction::UserId).big_integer().not_null())
                    .col(ColumnDef::new(PostReaction::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PostReaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reaction_post")
                            .from(PostReaction::Table, PostReaction::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reaction_user")
                            .from(PostReaction::Table, PostReaction::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, user_id) - one reaction per user per post.
        // This is the serialization point for concurrent toggles on the
        // same pair.
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reaction_post_user")
                    .table(PostReaction::Table)
                    .col(PostReaction::PostId)
                    .col(PostReaction::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing posts a user liked)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reaction_user_id")
                    .table(PostReaction::Table)
                    .col(PostReaction::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostReaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostReaction {
    Table,
    Id,
    PostId,
    UserId,
    Kind,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
