// src/db/comanda_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::comanda::{Comanda, ComandaItem, ComandaStatus},
};

#[derive(Clone)]
pub struct ComandaRepository {
    pool: PgPool,
}

impl ComandaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        walkin_name: Option<&str>,
    ) -> Result<Comanda, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comanda = sqlx::query_as::<_, Comanda>(
            "INSERT INTO comandas (customer_id, walkin_name) VALUES ($1, $2) RETURNING *",
        )
        .bind(customer_id)
        .bind(walkin_name)
        .fetch_one(executor)
        .await?;
        Ok(comanda)
    }

    pub async fn get_all(&self) -> Result<Vec<Comanda>, AppError> {
        let comandas =
            sqlx::query_as::<_, Comanda>("SELECT * FROM comandas ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(comandas)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
    ) -> Result<Option<Comanda>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comanda = sqlx::query_as::<_, Comanda>("SELECT * FROM comandas WHERE id = $1")
            .bind(comanda_id)
            .fetch_optional(executor)
            .await?;
        Ok(comanda)
    }

    /// Trava a linha da comanda: impede dois fechamentos concorrentes.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
    ) -> Result<Option<Comanda>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comanda =
            sqlx::query_as::<_, Comanda>("SELECT * FROM comandas WHERE id = $1 FOR UPDATE")
                .bind(comanda_id)
                .fetch_optional(executor)
                .await?;
        Ok(comanda)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
        status: ComandaStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE comandas SET status = $2 WHERE id = $1")
            .bind(comanda_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Itens
    // ---

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
    ) -> Result<Vec<ComandaItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items =
            sqlx::query_as::<_, ComandaItem>("SELECT * FROM comanda_items WHERE comanda_id = $1")
                .bind(comanda_id)
                .fetch_all(executor)
                .await?;
        Ok(items)
    }

    pub async fn get_item_for_update<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<ComandaItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ComandaItem>(
            "SELECT * FROM comanda_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    /// UPSERT: lançar um produto já presente na comanda soma as quantidades
    /// (invariante: uma linha por produto).
    pub async fn upsert_item<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        unit_cost: Decimal,
    ) -> Result<ComandaItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ComandaItem>(
            r#"
            INSERT INTO comanda_items (comanda_id, product_id, quantity, unit_price, unit_cost)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (comanda_id, product_id)
            DO UPDATE SET quantity = comanda_items.quantity + $3
            RETURNING *
            "#,
        )
        .bind(comanda_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(unit_cost)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn set_item_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<ComandaItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ComandaItem>(
            "UPDATE comanda_items SET quantity = $2 WHERE id = $1 RETURNING *",
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;

        item.ok_or(AppError::NotFound("Item da comanda"))
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM comanda_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item da comanda"));
        }
        Ok(())
    }
}
