// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,                   // Em preparação
    AwaitingInstallmentApproval,  // Boleto aguardando aprovação
    InstallmentDenied,            // Boleto negado
    InstallmentInPayment,         // Boleto em pagamento
    Shipped,                      // Enviado
    Delivered,                    // Entregue
    Fiado,                        // Crediário em aberto
    Cancelled,                    // Cancelado
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::InstallmentDenied
        )
    }

    /// Tabela de legalidade das transições disparadas por UpdateStatus.
    /// Cancelamento tem operação própria (com devolução de estoque) e não
    /// passa por aqui; estados terminais não saem do lugar.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self == target {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        target != OrderStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
    BoletoVirtual,
    Fiado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cancelled_by_actor", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    Customer,
    Admin,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,

    #[schema(example = "150.00")]
    pub total_value: Decimal,

    pub payment_method: PaymentMethod,
    // Preservado quando o pedido vira FIADO
    pub original_payment_method: Option<PaymentMethod>,
    pub delivery_location: Option<String>,
    pub status: OrderStatus,

    // Valor entregue pelo cliente em dinheiro (para cálculo de troco)
    pub amount_paid: Option<Decimal>,
    pub cancelled_by: Option<CancelledBy>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,

    // Congelados na criação: mudanças futuras de preço/custo não
    // alteram pedidos históricos.
    #[schema(example = "10.00")]
    pub unit_price: Decimal,
    #[schema(example = "6.50")]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn terminal_states_never_transition() {
        for terminal in [Delivered, Cancelled, InstallmentDenied] {
            for target in [Processing, Shipped, Fiado, Delivered] {
                if target == terminal {
                    continue;
                }
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn same_status_is_always_legal() {
        for s in [Processing, Shipped, Delivered, Fiado, Cancelled] {
            assert!(s.can_transition_to(s));
        }
    }

    #[test]
    fn cancellation_is_not_reachable_via_status_update() {
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn open_states_can_move_forward() {
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Fiado));
        assert!(AwaitingInstallmentApproval.can_transition_to(InstallmentInPayment));
        assert!(AwaitingInstallmentApproval.can_transition_to(InstallmentDenied));
        assert!(InstallmentInPayment.can_transition_to(Delivered));
    }
}
