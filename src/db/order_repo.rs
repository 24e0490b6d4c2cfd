// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{CancelledBy, Order, OrderItem, OrderStatus, PaymentMethod},
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        total_value: Decimal,
        payment_method: PaymentMethod,
        original_payment_method: Option<PaymentMethod>,
        delivery_location: Option<&str>,
        status: OrderStatus,
        amount_paid: Option<Decimal>,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                customer_id, total_value, payment_method, original_payment_method,
                delivery_location, status, amount_paid, delivery_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(total_value)
        .bind(payment_method)
        .bind(original_payment_method)
        .bind(delivery_location)
        .bind(status)
        .bind(amount_paid)
        .bind(delivery_date)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn get_all(&self) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Trava a linha do pedido antes de uma transição de status, impedindo
    /// que duas requisições concorrentes leiam o mesmo estado.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Pedidos fiado em aberto de um cliente, do mais antigo para o mais
    /// novo (base da amortização FIFO), todos travados para atualização.
    pub async fn get_open_fiado_for_update<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE customer_id = $1 AND status = 'FIADO'
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    /// Mesma seleção de `get_open_fiado_for_update`, sem travar (consulta
    /// de saldo).
    pub async fn list_open_fiado<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE customer_id = $1 AND status = 'FIADO'
            ORDER BY created_at ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        status: OrderStatus,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE orders SET status = $2, delivery_date = $3 WHERE id = $1")
            .bind(order_id)
            .bind(status)
            .bind(delivery_date)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Transição para FIADO: preserva o método de pagamento anterior.
    pub async fn set_status_fiado<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        original_payment_method: PaymentMethod,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'FIADO', original_payment_method = $2,
                payment_method = 'FIADO', delivery_date = NULL
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(original_payment_method)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_cancelled<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        cancelled_by: CancelledBy,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'CANCELLED', cancelled_by = $2, delivery_date = NULL
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(cancelled_by)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Itens
    // ---

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        unit_cost: Decimal,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, unit_cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(unit_cost)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn get_item_for_update<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE id = $1 FOR UPDATE")
                .bind(item_id)
                .fetch_optional(executor)
                .await?;
        Ok(item)
    }

    pub async fn set_item_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            "UPDATE order_items SET quantity = $2 WHERE id = $1 RETURNING *",
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;

        item.ok_or(AppError::NotFound("Item do pedido"))
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Recalcula e grava o total em UMA única query (UPDATE com subquery),
    /// retornando o novo total.
    pub async fn recalculate_total<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE orders
            SET total_value = (
                SELECT COALESCE(SUM(quantity * unit_price), 0)
                FROM order_items
                WHERE order_items.order_id = orders.id
            )
            WHERE id = $1
            RETURNING total_value
            "#,
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }
}
