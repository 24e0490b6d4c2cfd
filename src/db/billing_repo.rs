// src/db/billing_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{FiadoPayment, Installment, InstallmentPlan},
};

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PLANOS DE PARCELAMENTO
    // =========================================================================

    pub async fn create_plan<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        installment_count: i32,
        installment_value: Decimal,
    ) -> Result<InstallmentPlan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, InstallmentPlan>(
            r#"
            INSERT INTO installment_plans (product_id, installment_count, installment_value)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(installment_count)
        .bind(installment_value)
        .fetch_one(executor)
        .await?;
        Ok(plan)
    }

    pub async fn get_plans_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<InstallmentPlan>, AppError> {
        let plans = sqlx::query_as::<_, InstallmentPlan>(
            "SELECT * FROM installment_plans WHERE product_id = $1 ORDER BY installment_count ASC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    pub async fn get_plan_by_id<'e, E>(
        &self,
        executor: E,
        plan_id: Uuid,
    ) -> Result<Option<InstallmentPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, InstallmentPlan>(
            "SELECT * FROM installment_plans WHERE id = $1",
        )
        .bind(plan_id)
        .fetch_optional(executor)
        .await?;
        Ok(plan)
    }

    pub async fn product_has_plan<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM installment_plans WHERE product_id = $1)",
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // =========================================================================
    //  PARCELAS
    // =========================================================================

    pub async fn insert_installment<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        number: i32,
        value: Decimal,
        due_date: NaiveDate,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(
            r#"
            INSERT INTO installments (order_id, number, value, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(number)
        .bind(value)
        .bind(due_date)
        .fetch_one(executor)
        .await?;
        Ok(installment)
    }

    pub async fn list_installments(&self, order_id: Uuid) -> Result<Vec<Installment>, AppError> {
        let installments = sqlx::query_as::<_, Installment>(
            "SELECT * FROM installments WHERE order_id = $1 ORDER BY number ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(installments)
    }

    pub async fn get_installment_for_update<'e, E>(
        &self,
        executor: E,
        installment_id: Uuid,
    ) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(
            "SELECT * FROM installments WHERE id = $1 FOR UPDATE",
        )
        .bind(installment_id)
        .fetch_optional(executor)
        .await?;
        Ok(installment)
    }

    pub async fn mark_installment_paid<'e, E>(
        &self,
        executor: E,
        installment_id: Uuid,
        payment_date: DateTime<Utc>,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(
            r#"
            UPDATE installments
            SET status = 'PAID', payment_date = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(installment_id)
        .bind(payment_date)
        .fetch_one(executor)
        .await?;
        Ok(installment)
    }

    pub async fn count_pending_installments<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM installments WHERE order_id = $1 AND status = 'PENDING'",
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    // =========================================================================
    //  FIADO (livro de pagamentos parciais)
    // =========================================================================

    pub async fn insert_fiado_payment<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        amount: Decimal,
    ) -> Result<FiadoPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, FiadoPayment>(
            "INSERT INTO fiado_payments (order_id, amount) VALUES ($1, $2) RETURNING *",
        )
        .bind(order_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn sum_fiado_payments<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM fiado_payments WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn list_fiado_payments(&self, order_id: Uuid) -> Result<Vec<FiadoPayment>, AppError> {
        let payments = sqlx::query_as::<_, FiadoPayment>(
            "SELECT * FROM fiado_payments WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}
