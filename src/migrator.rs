use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_products_table::Migration),
            Box::new(m20250301_000002_create_product_lots_table::Migration),
            Box::new(m20250301_000003_create_stock_movements_table::Migration),
            Box::new(m20250301_000004_create_appointments_table::Migration),
            Box::new(m20250301_000005_create_financial_entries_table::Migration),
        ]
    }
}

// Migration implementations
//
// No foreign keys: product deletion is an administrative action that does not
// cascade-verify against lots or movements, and movement rows must outlive
// the product they snapshot.

mod m20250301_000001_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_products_table"
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
                        .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Products::TenantId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Products::Category).string_len(100).null())
                        .col(ColumnDef::new(Products::UseType).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Products::MeasureUnit)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::MeasureValue)
                                .decimal_len(19, 3)
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .decimal_len(19, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CurrentStock)
                                .decimal_len(19, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CostPrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::SalePrice).decimal_len(19, 4).null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_tenant_id")
                        .table(Products::Table)
                        .col(Products::TenantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_tenant_name")
                        .table(Products::Table)
                        .col(Products::TenantId)
                        .col(Products::Name)
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
    enum Products {
        Table,
        Id,
        TenantId,
        Name,
        Category,
        UseType,
        MeasureUnit,
        MeasureValue,
        MinStock,
        CurrentStock,
        CostPrice,
        SalePrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_product_lots_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_product_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductLots::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductLots::TenantId).uuid().not_null())
                        .col(ColumnDef::new(ProductLots::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductLots::BatchNumber)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::TotalCost)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::UnitCost)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::InitialQuantity)
                                .decimal_len(19, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::CurrentQuantity)
                                .decimal_len(19, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::EntryDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductLots::ExpirationDate).date().null())
                        .col(
                            ColumnDef::new(ProductLots::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductLots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO listing reads (product_id, is_active) ordered by entry_date
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_lots_fifo")
                        .table(ProductLots::Table)
                        .col(ProductLots::ProductId)
                        .col(ProductLots::IsActive)
                        .col(ProductLots::EntryDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_lots_tenant_id")
                        .table(ProductLots::Table)
                        .col(ProductLots::TenantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductLots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductLots {
        Table,
        Id,
        TenantId,
        ProductId,
        BatchNumber,
        TotalCost,
        UnitCost,
        InitialQuantity,
        CurrentQuantity,
        EntryDate,
        ExpirationDate,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_stock_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockMovements::TenantId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::ProductName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(10)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::Reason)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(19, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CostValue)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::SaleValue)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::PerformedBy)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::OccurredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_product_date")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .col(StockMovements::OccurredAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_tenant_date")
                        .table(StockMovements::Table)
                        .col(StockMovements::TenantId)
                        .col(StockMovements::OccurredAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        TenantId,
        ProductId,
        ProductName,
        MovementType,
        Reason,
        Quantity,
        CostValue,
        SaleValue,
        PerformedBy,
        OccurredAt,
        CreatedAt,
    }
}

mod m20250301_000004_create_appointments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_appointments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Appointments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Appointments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Appointments::TenantId).uuid().not_null())
                        .col(
                            ColumnDef::new(Appointments::CustomerName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::ServiceName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::ServicePrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Appointments::ScheduledAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_appointments_tenant_scheduled")
                        .table(Appointments::Table)
                        .col(Appointments::TenantId)
                        .col(Appointments::ScheduledAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Appointments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Appointments {
        Table,
        Id,
        TenantId,
        CustomerName,
        ServiceName,
        ServicePrice,
        ScheduledAt,
        Status,
        CompletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000005_create_financial_entries_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_financial_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FinancialEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinancialEntries::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(FinancialEntries::TenantId).uuid().not_null())
                        .col(
                            ColumnDef::new(FinancialEntries::Kind)
                                .string_len(10)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialEntries::Description)
                                .string_len(500)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialEntries::Amount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialEntries::AppointmentId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FinancialEntries::RecordedBy)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(ColumnDef::new(FinancialEntries::EntryDate).date().not_null())
                        .col(
                            ColumnDef::new(FinancialEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_financial_entries_tenant_date")
                        .table(FinancialEntries::Table)
                        .col(FinancialEntries::TenantId)
                        .col(FinancialEntries::EntryDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FinancialEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FinancialEntries {
        Table,
        Id,
        TenantId,
        Kind,
        Description,
        Amount,
        AppointmentId,
        RecordedBy,
        EntryDate,
        CreatedAt,
    }
}
