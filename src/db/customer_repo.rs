// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{CartItem, Customer},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, email) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Converte violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("O e-mail '{email}'"));
                }
            }
            e.into()
        })
    }

    pub async fn get_all(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    // ---
    // Carrinho
    // ---

    /// UPSERT: adicionar um produto já presente soma as quantidades em vez
    /// de criar linha duplicada. Atômico, previne race conditions.
    pub async fn upsert_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (customer_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + $3
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn set_cart_item_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE customer_id = $1 AND product_id = $2
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        item.ok_or(AppError::NotFound("Item do carrinho"))
    }

    pub async fn remove_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = $2")
                .bind(customer_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item do carrinho"));
        }
        Ok(())
    }

    pub async fn get_cart<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<CartItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE customer_id = $1 ORDER BY created_at ASC",
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn clear_cart<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
            .bind(customer_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
