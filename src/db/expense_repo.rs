// src/db/expense_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::expense::{Expense, ExpenseCategory},
};

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<ExpenseCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ExpenseCategory>(
            "INSERT INTO expense_categories (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("A categoria '{name}'"));
                }
            }
            e.into()
        })
    }

    pub async fn get_all_categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT * FROM expense_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get_category<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
    ) -> Result<Option<ExpenseCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category =
            sqlx::query_as::<_, ExpenseCategory>("SELECT * FROM expense_categories WHERE id = $1")
                .bind(category_id)
                .fetch_optional(executor)
                .await?;
        Ok(category)
    }

    /// A categoria protegida que recebe as baixas de estoque.
    pub async fn get_write_off_category<'e, E>(
        &self,
        executor: E,
    ) -> Result<ExpenseCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT * FROM expense_categories WHERE protected = TRUE AND name = 'Perdas de Estoque'",
        )
        .fetch_optional(executor)
        .await?;

        category.ok_or(AppError::NotFound("Categoria de perdas"))
    }

    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM expense_categories WHERE id = $1")
            .bind(category_id)
            .execute(executor)
            .await
            .map_err(|e| {
                // Despesas existentes apontando para a categoria bloqueiam o DELETE
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return AppError::ForeignKeyInUse;
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Categoria de despesa"));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_expense<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        description: &str,
        amount: Decimal,
        expense_date: NaiveDate,
        product_id: Option<Uuid>,
        stock_write_off_quantity: Option<i32>,
    ) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (
                category_id, description, amount, expense_date,
                product_id, stock_write_off_quantity
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(category_id)
        .bind(description)
        .bind(amount)
        .bind(expense_date)
        .bind(product_id)
        .bind(stock_write_off_quantity)
        .fetch_one(executor)
        .await?;
        Ok(expense)
    }

    pub async fn get_all_expenses(&self) -> Result<Vec<Expense>, AppError> {
        let expenses =
            sqlx::query_as::<_, Expense>("SELECT * FROM expenses ORDER BY expense_date DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(expenses)
    }
}
