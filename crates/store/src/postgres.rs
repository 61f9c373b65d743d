use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use domain::{Order, Product, ProductStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::query::{OrderFilter, OrderSort, PageRequest, ProductFilter, ProductSort};
use crate::store::{OrderStore, ProductStore, StockDecrement, StockLevel};

/// PostgreSQL-backed store.
///
/// Products are stored as flat columns (variants as JSONB); orders are
/// stored as a JSONB document plus the columns the query layer filters
/// and sorts on. Stock mutations are single conditional `UPDATE`
/// statements, which is what makes them atomic under concurrent
/// checkouts. Order numbers come from a database sequence.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let variants_json: serde_json::Value = row.try_get("variants")?;
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            status: parse_status(row.try_get("status")?)?,
            inventory: to_inventory(row.try_get("inventory")?)?,
            variants: serde_json::from_value(variants_json)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let doc: serde_json::Value = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    fn row_to_stock_level(row: PgRow) -> Result<StockLevel> {
        Ok(StockLevel {
            inventory: to_inventory(row.try_get("inventory")?)?,
            status: parse_status(row.try_get("status")?)?,
        })
    }
}

fn parse_status(raw: String) -> Result<ProductStatus> {
    raw.parse().map_err(StoreError::InvalidRecord)
}

fn to_inventory(raw: i64) -> Result<u32> {
    u32::try_from(raw)
        .map_err(|_| StoreError::InvalidRecord(format!("inventory out of range: {raw}")))
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ")
            .push_bind(payment_status.as_str());
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id.as_uuid());
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(ref term) = filter.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR shipping_phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(min) = filter.price_min {
        qb.push(" AND price_cents >= ").push_bind(min.cents());
    }
    if let Some(max) = filter.price_max {
        qb.push(" AND price_cents <= ").push_bind(max.cents());
    }
    if let Some(ref term) = filter.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, price_cents, description, image, status, inventory, variants, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.status.as_str())
        .bind(i64::from(product.inventory))
        .bind(serde_json::to_value(&product.variants)?)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, price_cents = $3, description = $4, image = $5,
                status = $6, variants = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.status.as_str())
        .bind(serde_json::to_value(&product.variants)?)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64)> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT * FROM products");
        push_product_filters(&mut qb, filter);
        qb.push(match sort {
            ProductSort::Newest => " ORDER BY created_at DESC",
            ProductSort::Oldest => " ORDER BY created_at ASC",
            ProductSort::PriceAsc => " ORDER BY price_cents ASC",
            ProductSort::PriceDesc => " ORDER BY price_cents DESC",
            ProductSort::NameAsc => " ORDER BY name ASC",
            ProductSort::NameDesc => " ORDER BY name DESC",
        });
        qb.push(" LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let products = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok((products, total as u64))
    }

    async fn decrement_stock(&self, id: ProductId, qty: u32) -> Result<StockDecrement> {
        // Single conditional update: the availability check and the
        // subtraction happen in one statement, so concurrent
        // decrements cannot both pass the check.
        let row = sqlx::query(
            r#"
            UPDATE products
            SET inventory = inventory - $2,
                status = CASE WHEN inventory - $2 = 0 THEN 'out_of_stock' ELSE status END,
                updated_at = now()
            WHERE id = $1 AND status = 'available' AND inventory >= $2
            RETURNING inventory, status
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(qty))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(StockDecrement::Applied(Self::row_to_stock_level(row)?));
        }

        // The conditional update matched nothing; classify why. The
        // follow-up read is for error reporting only, it does not
        // participate in the atomicity contract.
        let row = sqlx::query("SELECT inventory, status FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(StockDecrement::NotFound),
            Some(row) => {
                let level = Self::row_to_stock_level(row)?;
                match level.status {
                    ProductStatus::Unavailable => {
                        Ok(StockDecrement::NotSellable(level.status))
                    }
                    _ => Ok(StockDecrement::Insufficient {
                        available: level.inventory,
                    }),
                }
            }
        }
    }

    async fn increment_stock(&self, id: ProductId, qty: u32) -> Result<Option<StockLevel>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET inventory = inventory + $2,
                status = CASE
                    WHEN status = 'out_of_stock' AND inventory + $2 > 0 THEN 'available'
                    ELSE status
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING inventory, status
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(qty))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_stock_level).transpose()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn next_order_number(&self) -> Result<u64> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq as u64)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, order_number, customer_id, customer_name, customer_email, shipping_phone,
                 status, payment_status, final_cents, created_at, version, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.order_number())
        .bind(order.customer_id().as_uuid())
        .bind(&order.customer().name)
        .bind(&order.customer().email)
        .bind(&order.shipping_address().phone)
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.final_amount().cents())
        .bind(order.created_at())
        .bind(order.version() as i64)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, order: &mut Order) -> Result<()> {
        let expected = order.version();
        order.mark_persisted();
        let doc = serde_json::to_value(&*order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, payment_status = $2, final_cents = $3, version = $4, doc = $5
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.final_amount().cents())
        .bind(order.version() as i64)
        .bind(doc)
        .bind(order.id().as_uuid())
        .bind(expected as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id().as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            None => Err(StoreError::OrderNotFound(order.id())),
            Some(actual) => Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected,
                actual: actual as u64,
            }),
        }
    }

    async fn find_orders(
        &self,
        filter: &OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64)> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_order_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT doc FROM orders");
        push_order_filters(&mut qb, filter);
        qb.push(match sort {
            OrderSort::Newest => " ORDER BY created_at DESC, order_number DESC",
            OrderSort::Oldest => " ORDER BY created_at ASC, order_number ASC",
            OrderSort::AmountAsc => " ORDER BY final_cents ASC, order_number ASC",
            OrderSort::AmountDesc => " ORDER BY final_cents DESC, order_number ASC",
        });
        qb.push(" LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        Ok((orders, total as u64))
    }

    async fn orders_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>> {
        let rows =
            sqlx::query("SELECT doc FROM orders WHERE created_at >= $1 ORDER BY created_at ASC")
                .bind(since)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }
}
