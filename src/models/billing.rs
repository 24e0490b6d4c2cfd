// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

// --- Plano de parcelamento ("boleto virtual") de um produto ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    pub id: Uuid,
    pub product_id: Uuid,

    #[schema(example = 3)]
    pub installment_count: i32,

    #[schema(example = "100.00")]
    pub installment_value: Decimal,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: Uuid,
    pub order_id: Uuid,

    // 1-based, na ordem dos vencimentos
    pub number: i32,

    pub value: Decimal,

    #[schema(value_type = String, format = Date, example = "2026-09-10")]
    pub due_date: NaiveDate,

    pub status: InstallmentStatus,
    pub payment_date: Option<DateTime<Utc>>,
}

// --- Pagamento parcial de fiado (append-only) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiadoPayment {
    pub id: Uuid,
    pub order_id: Uuid,

    #[schema(example = "50.00")]
    pub amount: Decimal,

    pub created_at: DateTime<Utc>,
}
