use sea_orm_migration::prelude::*;

/// Genre names are stored lowercased, so a plain unique index is the
/// case-insensitive uniqueness constraint.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_genre_name_unique")
                    .table(Genre::Table)
                    .col(Genre::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_genre_name_unique").table(Genre::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Name,
}
