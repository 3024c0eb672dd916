use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_users_table::Migration),
            Box::new(m20241001_000002_create_products_table::Migration),
            Box::new(m20241001_000003_create_issues_table::Migration),
            Box::new(m20241001_000004_create_issue_items_table::Migration),
            Box::new(m20241001_000005_create_restocks_table::Migration),
        ]
    }
}

mod m20241001_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241001_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::Phone).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::Status).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Users {
        Table,
        Id,
        Name,
        Email,
        Phone,
        PasswordHash,
        Role,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20241001_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241001_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).text().not_null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(Products::Quantity).gte(0)),
                        )
                        .col(ColumnDef::new(Products::ImageUrl).string().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Name,
        Description,
        Price,
        Quantity,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20241001_000003_create_issues_table {
    use super::m20241001_000001_create_users_table::Users;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241001_000003_create_issues_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Issues::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Issues::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Issues::IssueId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Issues::OperatorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Issues::DateIssued)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Issues::OperatorComment).text().not_null())
                        .col(ColumnDef::new(Issues::CustomerName).string().not_null())
                        .col(ColumnDef::new(Issues::CustomerPhone).string().not_null())
                        .col(ColumnDef::new(Issues::CustomerLocation).string().not_null())
                        .col(
                            ColumnDef::new(Issues::DiscountPercent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Issues::DiscountAmount)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_issues_operator_id")
                                .from(Issues::Table, Issues::OperatorId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_issues_date_issued")
                        .table(Issues::Table)
                        .col(Issues::DateIssued)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Issues::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Issues {
        Table,
        Id,
        IssueId,
        OperatorId,
        DateIssued,
        OperatorComment,
        CustomerName,
        CustomerPhone,
        CustomerLocation,
        DiscountPercent,
        DiscountAmount,
    }
}

mod m20241001_000004_create_issue_items_table {
    use super::m20241001_000002_create_products_table::Products;
    use super::m20241001_000003_create_issues_table::Issues;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241001_000004_create_issue_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IssueItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IssueItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(IssueItems::IssueRecordId).uuid().not_null())
                        .col(ColumnDef::new(IssueItems::LineNo).integer().not_null())
                        .col(ColumnDef::new(IssueItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(IssueItems::ProductName).string().not_null())
                        .col(
                            ColumnDef::new(IssueItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(IssueItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_issue_items_issue_record_id")
                                .from(IssueItems::Table, IssueItems::IssueRecordId)
                                .to(Issues::Table, Issues::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_issue_items_product_id")
                                .from(IssueItems::Table, IssueItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_issue_items_issue_record_id")
                        .table(IssueItems::Table)
                        .col(IssueItems::IssueRecordId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IssueItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum IssueItems {
        Table,
        Id,
        IssueRecordId,
        LineNo,
        ProductId,
        ProductName,
        UnitPrice,
        Quantity,
    }
}

mod m20241001_000005_create_restocks_table {
    use super::m20241001_000001_create_users_table::Users;
    use super::m20241001_000002_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241001_000005_create_restocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Restocks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Restocks::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Restocks::RestockerId).uuid().not_null())
                        .col(ColumnDef::new(Restocks::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Restocks::OldQuantity).integer().not_null())
                        .col(ColumnDef::new(Restocks::NewQuantity).integer().not_null())
                        .col(
                            ColumnDef::new(Restocks::RestockDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_restocks_restocker_id")
                                .from(Restocks::Table, Restocks::RestockerId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_restocks_product_id")
                                .from(Restocks::Table, Restocks::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_restocks_restock_date")
                        .table(Restocks::Table)
                        .col(Restocks::RestockDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Restocks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Restocks {
        Table,
        Id,
        RestockerId,
        ProductId,
        OldQuantity,
        NewQuantity,
        RestockDate,
    }
}
