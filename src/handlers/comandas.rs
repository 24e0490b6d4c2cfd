// src/handlers/comandas.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError, config::AppState, models::order::PaymentMethod,
};

// ---
// Payloads
// ---

fn validate_comanda_holder(payload: &OpenComandaPayload) -> Result<(), ValidationError> {
    if payload.customer_id.is_none() && payload.walkin_name.is_none() {
        let mut err = ValidationError::new("holder");
        err.message = Some("Informe o cliente ou o nome do avulso.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_comanda_holder"))]
pub struct OpenComandaPayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, message = "O nome do avulso não pode ser vazio."))]
    #[schema(example = "Mesa 4")]
    pub walkin_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComandaItemPayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComandaItemPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseComandaPayload {
    pub payment_method: PaymentMethod,
    pub cash_tendered: Option<Decimal>,
}

// ---
// Handlers
// ---

// POST /api/comandas
#[utoipa::path(
    post,
    path = "/api/comandas",
    tag = "Comandas",
    request_body = OpenComandaPayload,
    responses(
        (status = 201, description = "Comanda aberta", body = crate::models::comanda::Comanda)
    )
)]
pub async fn open_comanda(
    State(app_state): State<AppState>,
    Json(payload): Json<OpenComandaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comanda = app_state
        .comanda_service
        .open(
            &app_state.db_pool,
            payload.customer_id,
            payload.walkin_name.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comanda)))
}

// GET /api/comandas
#[utoipa::path(
    get,
    path = "/api/comandas",
    tag = "Comandas",
    responses(
        (status = 200, description = "Lista de comandas", body = [crate::models::comanda::Comanda])
    )
)]
pub async fn get_all_comandas(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let comandas = app_state.comanda_service.get_all().await?;
    Ok((StatusCode::OK, Json(comandas)))
}

// GET /api/comandas/{id}
#[utoipa::path(
    get,
    path = "/api/comandas/{id}",
    tag = "Comandas",
    params(("id" = Uuid, Path, description = "ID da Comanda")),
    responses(
        (status = 200, description = "Comanda com itens", body = crate::models::comanda::ComandaDetail),
        (status = 404, description = "Comanda não encontrada")
    )
)]
pub async fn get_comanda(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .comanda_service
        .get_detail(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/comandas/{id}/items (baixa o estoque no ato)
#[utoipa::path(
    post,
    path = "/api/comandas/{id}/items",
    tag = "Comandas",
    params(("id" = Uuid, Path, description = "ID da Comanda")),
    request_body = ComandaItemPayload,
    responses(
        (status = 201, description = "Item lançado na comanda", body = crate::models::comanda::ComandaItem),
        (status = 400, description = "Estoque insuficiente ou comanda fechada")
    )
)]
pub async fn add_comanda_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ComandaItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .comanda_service
        .add_item(&app_state.db_pool, id, payload.product_id, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/comandas/items/{item_id}
#[utoipa::path(
    put,
    path = "/api/comandas/items/{item_id}",
    tag = "Comandas",
    params(("item_id" = Uuid, Path, description = "ID do Item da Comanda")),
    request_body = UpdateComandaItemPayload,
    responses(
        (status = 200, description = "Quantidade ajustada", body = crate::models::comanda::ComandaItem),
        (status = 400, description = "Estoque insuficiente")
    )
)]
pub async fn update_comanda_item(
    State(app_state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateComandaItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .comanda_service
        .update_item_quantity(&app_state.db_pool, item_id, payload.quantity)
        .await?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/comandas/items/{item_id} (devolve o estoque)
#[utoipa::path(
    delete,
    path = "/api/comandas/items/{item_id}",
    tag = "Comandas",
    params(("item_id" = Uuid, Path, description = "ID do Item da Comanda")),
    responses((status = 204, description = "Item estornado"))
)]
pub async fn remove_comanda_item(
    State(app_state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .comanda_service
        .remove_item(&app_state.db_pool, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/comandas/{id}/close
#[utoipa::path(
    post,
    path = "/api/comandas/{id}/close",
    tag = "Comandas",
    params(("id" = Uuid, Path, description = "ID da Comanda")),
    request_body = CloseComandaPayload,
    responses(
        (status = 201, description = "Comanda convertida em pedido", body = crate::models::order::Order),
        (status = 400, description = "Comanda sem itens"),
        (status = 400, description = "Comanda já fechada")
    )
)]
pub async fn close_comanda(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseComandaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .comanda_service
        .close(
            &app_state.db_pool,
            id,
            payload.payment_method,
            payload.cash_tendered,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}
