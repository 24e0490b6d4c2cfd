// src/handlers/orders.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::order::{CancelledBy, OrderStatus, PaymentMethod},
    services::order_service::{SaleItem, change_due},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub customer_id: Uuid,
    pub payment_method: PaymentMethod,
    pub delivery_location: Option<String>,

    // Obrigatórios quando paymentMethod = BOLETO_VIRTUAL
    pub plan_id: Option<Uuid>,

    #[validate(range(min = 1, max = 28, message = "O dia de vencimento deve estar entre 1 e 28."))]
    pub due_day: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalSalePayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A venda precisa de ao menos um item."))]
    #[validate(nested)]
    pub items: Vec<SaleItemPayload>,

    pub payment_method: PaymentMethod,

    // Valor entregue em espécie, para cálculo de troco
    pub cash_tendered: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalSaleResponse {
    #[serde(flatten)]
    pub order: crate::models::order::Order,
    pub change: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderPayload {
    pub actor: CancelledBy,

    // Obrigatório quando actor = CUSTOMER, para checagem de posse
    pub customer_id: Option<Uuid>,

    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemQuantityPayload {
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotalResponse {
    pub total_value: Decimal,
}

// ---
// Handlers
// ---

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Lista de pedidos", body = [crate::models::order::Order])
    )
)]
pub async fn get_all_orders(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.order_service.get_all().await?;
    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    responses(
        (status = 200, description = "Pedido com itens", body = crate::models::order::OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .order_service
        .get_detail(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/orders/checkout
#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    tag = "Orders",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Pedido criado a partir do carrinho", body = crate::models::order::Order),
        (status = 400, description = "Carrinho vazio ou seleção de parcelamento ausente"),
        (status = 400, description = "Estoque insuficiente")
    )
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .order_service
        .checkout(
            &app_state.db_pool,
            payload.customer_id,
            payload.payment_method,
            payload.delivery_location.as_deref(),
            payload.plan_id,
            payload.due_day,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// POST /api/orders/physical-sale
#[utoipa::path(
    post,
    path = "/api/orders/physical-sale",
    tag = "Orders",
    request_body = PhysicalSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = PhysicalSaleResponse),
        (status = 400, description = "Estoque insuficiente")
    )
)]
pub async fn physical_sale(
    State(app_state): State<AppState>,
    Json(payload): Json<PhysicalSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let items: Vec<SaleItem> = payload
        .items
        .iter()
        .map(|i| SaleItem {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let order = app_state
        .order_service
        .physical_sale(
            &app_state.db_pool,
            payload.customer_id,
            &items,
            payload.payment_method,
            payload.cash_tendered,
        )
        .await?;

    let change = payload
        .cash_tendered
        .map(|cash| change_due(order.total_value, cash));

    Ok((StatusCode::CREATED, Json(PhysicalSaleResponse { order, change })))
}

// PUT /api/orders/{id}/status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = crate::models::order::Order),
        (status = 400, description = "Transição de status não permitida")
    )
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .update_status(&app_state.db_pool, id, payload.status)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// POST /api/orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    request_body = CancelOrderPayload,
    responses(
        (status = 200, description = "Pedido cancelado, estoque restituído", body = crate::models::order::Order),
        (status = 403, description = "Pedido pertence a outro cliente"),
        (status = 400, description = "Pedido não pode mais ser cancelado")
    )
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = match payload.actor {
        CancelledBy::Customer => {
            let customer_id = payload.customer_id.ok_or_else(|| {
                AppError::InvalidStateTransition(
                    "Cancelamento pelo cliente exige o ID do cliente.".into(),
                )
            })?;
            app_state
                .order_service
                .cancel_by_customer(&app_state.db_pool, id, customer_id)
                .await?
        }
        CancelledBy::Admin => {
            app_state
                .order_service
                .cancel_by_admin(&app_state.db_pool, id, payload.reason.as_deref())
                .await?
        }
    };

    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/items/{item_id}
#[utoipa::path(
    put,
    path = "/api/orders/items/{item_id}",
    tag = "Orders",
    params(("item_id" = Uuid, Path, description = "ID do Item do Pedido")),
    request_body = UpdateItemQuantityPayload,
    responses(
        (status = 200, description = "Quantidade ajustada; retorna o novo total do pedido", body = OrderTotalResponse),
        (status = 400, description = "Estoque insuficiente ou pedido cancelado")
    )
)]
pub async fn update_order_item(
    State(app_state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let total_value = app_state
        .order_service
        .update_item_quantity(&app_state.db_pool, item_id, payload.quantity)
        .await?;

    Ok((StatusCode::OK, Json(OrderTotalResponse { total_value })))
}
