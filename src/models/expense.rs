// src/models/expense.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    pub id: Uuid,

    #[schema(example = "Perdas de Estoque")]
    pub name: String,

    // Categorias protegidas (ex.: "Perdas de Estoque") não podem ser removidas
    pub protected: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub category_id: Uuid,

    #[schema(example = "Baixa de estoque: produto vencido")]
    pub description: String,

    #[schema(example = "82.50")]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2026-08-28")]
    pub expense_date: NaiveDate,

    // Quando presentes, a criação da despesa também executa a baixa
    // de estoque correspondente.
    pub product_id: Option<Uuid>,
    pub stock_write_off_quantity: Option<i32>,

    pub created_at: DateTime<Utc>,
}
