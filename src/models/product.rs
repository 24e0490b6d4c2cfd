// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Produto (catálogo + valuation de estoque) ---
// O trio quantity / weighted_avg_cost / total_inventory_cost é mantido
// consistente por toda mutação do StockService.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(example = "Refrigerante Lata 350ml")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = "4.50")]
    pub sale_price: Decimal,

    #[schema(example = 120)]
    pub stock_quantity: i32,

    #[schema(example = "2.75")]
    pub weighted_avg_cost: Decimal,

    #[schema(example = "330.00")]
    pub total_inventory_cost: Decimal,

    // Fracionamento: o produto "unidade" aponta para o produto "caixa";
    // o rendimento por caixa (units_per_parent) fica na linha da caixa
    pub parent_id: Option<Uuid>,
    pub units_per_parent: Option<i32>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementReason {
    Restock,
    Sale,
    Return,
    Correction,
    WriteOff,
    UnbundleIn,
    UnbundleOut,
    TabItem,
}

// --- Livro-razão de movimentações (auditoria) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,

    #[schema(example = -3, value_type = i32)]
    pub quantity_changed: i32,

    pub reason: StockMovementReason,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
