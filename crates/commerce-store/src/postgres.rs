use async_trait::async_trait;
use chrono::Utc;
use common::{
    CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartItemRecord, CartRecord, CategoryRecord, OrderItemRecord, OrderRecord, PaymentRecord,
    ProductRecord, Result, StoreError,
    error::constraints,
    store::{CommerceStore, validate_order_lines},
};

/// PostgreSQL-backed commerce store implementation.
#[derive(Clone)]
pub struct PostgresCommerceStore {
    pool: PgPool,
}

impl PostgresCommerceStore {
    /// Creates a new PostgreSQL commerce store.
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

    fn row_to_category(row: PgRow) -> Result<CategoryRecord> {
        Ok(CategoryRecord {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<CartRecord> {
        Ok(CartRecord {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItemRecord> {
        Ok(CartItemRecord {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            payment_id: PaymentId::from_uuid(row.try_get::<Uuid, _>("payment_id")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_payment(row: PgRow) -> Result<PaymentRecord> {
        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            provider: row.try_get("provider")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn map_insert_error(e: sqlx::Error) -> StoreError {
        // Surface collisions with the partial unique indexes so callers can
        // translate them into domain errors.
        if let sqlx::Error::Database(ref db_err) = e
            && let Some(constraint) = db_err.constraint()
            && [
                constraints::ACTIVE_CART_PER_USER,
                constraints::ACTIVE_CART_ITEM_PER_PRODUCT,
                constraints::ACTIVE_PAYMENT_PER_USER,
            ]
            .contains(&constraint)
        {
            return StoreError::UniqueViolation {
                constraint: constraint.to_string(),
            };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl CommerceStore for PostgresCommerceStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_category(&self, category: CategoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .bind(category.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at, deleted_at
            FROM categories
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, price_cents, quantity, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.category_id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.quantity as i64)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, name, price_cents, quantity, created_at, updated_at, deleted_at
            FROM products
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn decrement_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>> {
        // Check and decrement in one guarded statement; concurrent callers
        // serialize on the row lock and the losers match zero rows.
        let row = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL AND quantity >= $2
            RETURNING id, category_id, name, price_cents, quantity, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(row)?)),
            None => {
                tracing::debug!(product_id = %id, quantity, "stock decrement matched no row");
                Ok(None)
            }
        }
    }

    async fn increment_product_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, category_id, name, price_cents, quantity, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn insert_cart(&self, cart: CartRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_cents, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.total.cents())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .bind(cart.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        Ok(())
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, created_at, updated_at, deleted_at
            FROM carts
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, created_at, updated_at, deleted_at
            FROM carts
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn update_cart_total(&self, id: CartId, total: Money) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE carts
            SET total_cents = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, user_id, total_cents, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(total.cents())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn soft_delete_cart_and_items(&self, id: CartId) -> Result<Option<CartRecord>> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            UPDATE carts
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, user_id, total_cents, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE cart_items
            SET deleted_at = $2, updated_at = $2
            WHERE cart_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(Self::row_to_cart(row)?))
    }

    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.cart_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity as i64)
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(item.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        Ok(())
    }

    async fn get_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at, deleted_at
            FROM cart_items
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn get_cart_item_by_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at, deleted_at
            FROM cart_items
            WHERE cart_id = $1 AND product_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at, deleted_at
            FROM cart_items
            WHERE cart_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, cart_id, product_id, quantity, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn soft_delete_cart_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE cart_items
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, cart_id, product_id, quantity, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn insert_order(&self, order: OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, payment_id, total_cents, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.payment_id.as_uuid())
        .bind(order.total.cents())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_order_with_items(
        &self,
        order: OrderRecord,
        items: Vec<OrderItemRecord>,
    ) -> Result<()> {
        validate_order_lines(&order, &items)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, payment_id, total_cents, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.payment_id.as_uuid())
        .bind(order.total.cents())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i64)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_order_item(&self, item: OrderItemRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity as i64)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, payment_id, total_cents, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, payment_id, total_cents, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, created_at
            FROM order_items
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order_item).transpose()
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, provider, status, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(&payment.provider)
        .bind(payment.status)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .bind(payment.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        Ok(())
    }

    async fn get_payment_by_user(&self, user_id: UserId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, provider, status, created_at, updated_at, deleted_at
            FROM payments
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }
}
