// src/models/comanda.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "comanda_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComandaStatus {
    Open,
    Closed, // Terminal: comanda fechada não reabre
}

// --- Comanda (pré-pedido itemizado) ---
// Cada item já baixou estoque no momento em que foi lançado; o fechamento
// converte tudo em exatamente um pedido e a comanda fica como histórico.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comanda {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,

    // Cliente avulso, sem cadastro
    #[schema(example = "Mesa 4")]
    pub walkin_name: Option<String>,

    pub status: ComandaStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComandaItem {
    pub id: Uuid,
    pub comanda_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,

    // Snapshot do preço/custo no momento do lançamento
    pub unit_price: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComandaDetail {
    #[serde(flatten)]
    pub comanda: Comanda,
    pub items: Vec<ComandaItem>,
}
