use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_items_table::Migration),
            Box::new(m20240101_000002_create_stock_levels_table::Migration),
            Box::new(m20240101_000003_create_orders_table::Migration),
            Box::new(m20240101_000004_create_order_items_table::Migration),
            Box::new(m20240101_000005_create_inventory_transactions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::ItemCode).string().not_null())
                        .col(ColumnDef::new(Items::ItemName).string().not_null())
                        .col(ColumnDef::new(Items::Description).string().null())
                        .col(ColumnDef::new(Items::UnitOfMeasure).string().not_null())
                        .col(
                            ColumnDef::new(Items::MinStockLevel)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::MaxStockLevel)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::StandardCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::IsReturnable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Items::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Items::CreatedBy).uuid().null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_item_code")
                        .table(Items::Table)
                        .col(Items::ItemCode)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Items {
        Table,
        Id,
        ItemCode,
        ItemName,
        Description,
        UnitOfMeasure,
        MinStockLevel,
        MaxStockLevel,
        StandardCost,
        IsReturnable,
        IsActive,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_levels_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_levels_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLevels::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockLevels::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockLevels::CurrentQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLevels::ReservedQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLevels::ReturnableQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLevels::AvailableQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLevels::LastUpdated)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One ledger row per item
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_levels_item_id")
                        .table(StockLevels::Table)
                        .col(StockLevels::ItemId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockLevels::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockLevels {
        Table,
        Id,
        ItemId,
        CurrentQuantity,
        ReservedQuantity,
        ReturnableQuantity,
        AvailableQuantity,
        LastUpdated,
    }
}

mod m20240101_000003_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerContact).string().not_null())
                        .col(ColumnDef::new(Orders::OrderDate).timestamp().not_null())
                        .col(ColumnDef::new(Orders::ExpectedDeliveryDate).date().null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Notes).string().null())
                        .col(ColumnDef::new(Orders::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerName,
        CustomerContact,
        OrderDate,
        ExpectedDeliveryDate,
        Status,
        TotalAmount,
        Notes,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::RequestedQuantity)
                                .decimal_len(15, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::FulfilledQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::ReturnableQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::TotalPrice)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Status).string().not_null())
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_item_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderItems {
        Table,
        Id,
        OrderId,
        ItemId,
        RequestedQuantity,
        FulfilledQuantity,
        ReturnableQuantity,
        UnitPrice,
        TotalPrice,
        Status,
        CreatedAt,
    }
}

mod m20240101_000005_create_inventory_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_inventory_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::OrderId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionSubType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Quantity)
                                .decimal_len(15, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReturnableQuantity)
                                .decimal_len(15, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::UnitCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TotalCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ReferenceNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::VendorCustomer)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Remarks).string().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ExpectedReturnDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ConfirmedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ConfirmedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_number")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::TransactionNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_item_id")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_order_id")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::OrderId)
                        .to_owned(),
                )
                .await?;

            // Return settlements are looked up by the original's number
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_reference")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::ReferenceNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryTransactions::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryTransactions {
        Table,
        Id,
        TransactionNumber,
        ItemId,
        OrderId,
        TransactionType,
        TransactionSubType,
        Quantity,
        ReturnableQuantity,
        UnitCost,
        TotalCost,
        ReferenceNumber,
        VendorCustomer,
        Remarks,
        TransactionDate,
        ExpectedReturnDate,
        Status,
        CreatedBy,
        ConfirmedAt,
        ConfirmedBy,
        CreatedAt,
    }
}
