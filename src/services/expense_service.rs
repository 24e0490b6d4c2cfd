// src/services/expense_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ExpenseRepository, ProductRepository},
    models::{
        expense::{Expense, ExpenseCategory},
        product::StockMovementReason,
    },
};

#[derive(Clone)]
pub struct ExpenseService {
    expense_repo: ExpenseRepository,
    product_repo: ProductRepository,
}

impl ExpenseService {
    pub fn new(expense_repo: ExpenseRepository, product_repo: ProductRepository) -> Self {
        Self {
            expense_repo,
            product_repo,
        }
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<ExpenseCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.expense_repo.create_category(executor, name).await
    }

    pub async fn get_all_categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        self.expense_repo.get_all_categories().await
    }

    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let category = self
            .expense_repo
            .get_category(&mut *tx, category_id)
            .await?
            .ok_or(AppError::NotFound("Categoria de despesa"))?;

        // "Perdas de Estoque" e afins ficam fora do alcance do DELETE
        if category.protected {
            return Err(AppError::ForeignKeyInUse);
        }

        self.expense_repo.delete_category(&mut *tx, category_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_all_expenses(&self) -> Result<Vec<Expense>, AppError> {
        self.expense_repo.get_all_expenses().await
    }

    /// Cria uma despesa. Quando produto + quantidade de baixa vêm juntos,
    /// a criação também executa a baixa de estoque: deduz a quantidade e
    /// valoriza a despesa em `quantidade × custo médio vigente` (a média
    /// em si não muda numa saída).
    pub async fn create_expense<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        description: &str,
        amount: Option<Decimal>,
        expense_date: Option<NaiveDate>,
        product_id: Option<Uuid>,
        stock_write_off_quantity: Option<i32>,
    ) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.expense_repo
            .get_category(&mut *tx, category_id)
            .await?
            .ok_or(AppError::NotFound("Categoria de despesa"))?;

        let expense_date = expense_date.unwrap_or_else(|| Utc::now().date_naive());

        let final_amount = match (product_id, stock_write_off_quantity) {
            (Some(pid), Some(qty)) if qty > 0 => {
                let product = self
                    .product_repo
                    .get_for_update(&mut *tx, pid)
                    .await?
                    .ok_or(AppError::NotFound("Produto"))?;

                if product.stock_quantity < qty {
                    return Err(AppError::InsufficientStock {
                        available: product.stock_quantity,
                    });
                }

                let new_qty = product.stock_quantity - qty;
                let new_total = Decimal::from(new_qty) * product.weighted_avg_cost;
                self.product_repo
                    .update_stock(&mut *tx, pid, new_qty, product.weighted_avg_cost, new_total, None)
                    .await?;
                self.product_repo
                    .record_movement(
                        &mut *tx,
                        pid,
                        -qty,
                        StockMovementReason::WriteOff,
                        None,
                        Some(description),
                    )
                    .await?;

                Decimal::from(qty) * product.weighted_avg_cost
            }
            _ => amount.ok_or_else(|| {
                AppError::InvalidStateTransition(
                    "Despesa sem baixa de estoque precisa de um valor.".into(),
                )
            })?,
        };

        let expense = self
            .expense_repo
            .create_expense(
                &mut *tx,
                category_id,
                description,
                final_amount,
                expense_date,
                product_id,
                stock_write_off_quantity,
            )
            .await?;

        tx.commit().await?;
        Ok(expense)
    }
}
