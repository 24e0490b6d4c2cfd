// src/handlers/cart.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState};

// O carrinho não reserva estoque: só o checkout valida e deduz.

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub customer_id: Uuid,
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    #[schema(example = 2)]
    pub quantity: i32,
}

// POST /api/cart/items (produto repetido soma quantidades)
#[utoipa::path(
    post,
    path = "/api/cart/items",
    tag = "Cart",
    request_body = CartItemPayload,
    responses(
        (status = 201, description = "Item adicionado/mesclado", body = crate::models::customer::CartItem)
    )
)]
pub async fn add_cart_item(
    State(app_state): State<AppState>,
    Json(payload): Json<CartItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Garante que o produto existe e está ativo antes de aceitar no carrinho
    app_state
        .stock_service
        .get_product(&app_state.db_pool, payload.product_id)
        .await?;

    let item = app_state
        .customer_repo
        .upsert_cart_item(payload.customer_id, payload.product_id, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/cart/items (define a quantidade absoluta)
#[utoipa::path(
    put,
    path = "/api/cart/items",
    tag = "Cart",
    request_body = CartItemPayload,
    responses(
        (status = 200, description = "Quantidade atualizada", body = crate::models::customer::CartItem)
    )
)]
pub async fn update_cart_item(
    State(app_state): State<AppState>,
    Json(payload): Json<CartItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .customer_repo
        .set_cart_item_quantity(payload.customer_id, payload.product_id, payload.quantity)
        .await?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/cart/{customer_id}/items/{product_id}
#[utoipa::path(
    delete,
    path = "/api/cart/{customer_id}/items/{product_id}",
    tag = "Cart",
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("product_id" = Uuid, Path, description = "ID do Produto")
    ),
    responses((status = 204, description = "Item removido"))
)]
pub async fn remove_cart_item(
    State(app_state): State<AppState>,
    Path((customer_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .customer_repo
        .remove_cart_item(customer_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/cart/{customer_id}
#[utoipa::path(
    get,
    path = "/api/cart/{customer_id}",
    tag = "Cart",
    params(("customer_id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Itens do carrinho", body = [crate::models::customer::CartItem])
    )
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .customer_repo
        .get_cart(&app_state.db_pool, customer_id)
        .await?;
    Ok((StatusCode::OK, Json(items)))
}
