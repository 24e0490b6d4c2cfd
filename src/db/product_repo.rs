// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{Product, StockMovement, StockMovementReason},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn get_all(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Trava a linha do produto ("SELECT ... FOR UPDATE") para o padrão
    /// "lock, lê, calcula, grava" de toda mutação de estoque.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(executor)
                .await?;
        Ok(product)
    }

    // ---
    // Funções de "Escrita"
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        sale_price: Decimal,
        parent_id: Option<Uuid>,
        units_per_parent: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, sale_price, parent_id, units_per_parent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(sale_price)
        .bind(parent_id)
        .bind(units_per_parent)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        name: &str,
        description: Option<&str>,
        sale_price: Decimal,
        parent_id: Option<Uuid>,
        units_per_parent: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, sale_price = $4,
                parent_id = $5, units_per_parent = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(description)
        .bind(sale_price)
        .bind(parent_id)
        .bind(units_per_parent)
        .fetch_optional(executor)
        .await?;

        product.ok_or(AppError::NotFound("Produto"))
    }

    /// Produtos nunca são removidos fisicamente; apenas desativados.
    pub async fn deactivate<'e, E>(&self, executor: E, product_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(product_id)
                .execute(executor)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Produto"));
        }
        Ok(())
    }

    /// Grava o trio quantidade / custo médio / custo total de uma vez,
    /// opcionalmente junto com um novo preço de venda.
    pub async fn update_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        stock_quantity: i32,
        weighted_avg_cost: Decimal,
        total_inventory_cost: Decimal,
        new_sale_price: Option<Decimal>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock_quantity = $2,
                weighted_avg_cost = $3,
                total_inventory_cost = $4,
                sale_price = COALESCE($5, sale_price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(stock_quantity)
        .bind(weighted_avg_cost)
        .bind(total_inventory_cost)
        .bind(new_sale_price)
        .fetch_optional(executor)
        .await?;

        product.ok_or(AppError::NotFound("Produto"))
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity_changed: i32,
        reason: StockMovementReason,
        unit_cost: Option<Decimal>,
        notes: Option<&str>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (product_id, quantity_changed, reason, unit_cost, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(quantity_changed)
        .bind(reason)
        .bind(unit_cost)
        .bind(notes)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}
