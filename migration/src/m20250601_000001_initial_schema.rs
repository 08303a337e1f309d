use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create principals table
        manager
            .create_table(
                Table::create()
                    .table(Principals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Principals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Principals::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(string(Principals::PasswordHash))
                    .col(string(Principals::RoleId))
                    .col(big_integer(Principals::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create acis table; role_id and user_id are mutually exclusive,
        // enforced at the application layer.
        manager
            .create_table(
                Table::create()
                    .table(Acis::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Acis::Id).string().not_null().primary_key())
                    .col(string_null(Acis::RoleId))
                    .col(string_null(Acis::UserId))
                    .col(string(Acis::Resource))
                    .col(string(Acis::Payload))
                    .col(big_integer(Acis::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Covering indexes for the two permission-check lookups
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_acis_role_resource_payload")
                    .table(Acis::Table)
                    .col(Acis::RoleId)
                    .col(Acis::Resource)
                    .col(Acis::Payload)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_acis_user_resource_payload")
                    .table(Acis::Table)
                    .col(Acis::UserId)
                    .col(Acis::Resource)
                    .col(Acis::Payload)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Acis::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Principals::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Principals {
    Table,
    Id,
    Username,
    PasswordHash,
    RoleId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Acis {
    Table,
    Id,
    RoleId,
    UserId,
    Resource,
    Payload,
    CreatedAt,
}
