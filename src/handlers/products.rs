// src/handlers/products.rs

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

use crate::{common::error::AppError, config::AppState};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateProduct
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Refrigerante Lata 350ml")]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "4.50")]
    pub sale_price: Decimal,

    // Fracionamento: este produto é fração de qual "caixa"?
    pub parent_id: Option<Uuid>,

    // Quantas unidades cada caixa rende; configurado no produto CAIXA
    #[validate(range(min = 1, message = "Unidades por caixa deve ser ao menos 1."))]
    pub units_per_parent: Option<i32>,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = crate::models::product::Product)
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .stock_service
        .create_product(
            &app_state.db_pool,
            &payload.name,
            payload.description.as_deref(),
            payload.sale_price,
            payload.parent_id,
            payload.units_per_parent,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Catálogo ativo", body = [crate::models::product::Product])
    )
)]
pub async fn get_all_products(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.stock_service.get_all_products().await?;
    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    tag = "Products",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto", body = crate::models::product::Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .stock_service
        .get_product(&app_state.db_pool, product_id)
        .await?;
    Ok((StatusCode::OK, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{product_id}",
    tag = "Products",
    request_body = CreateProductPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = crate::models::product::Product)
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .stock_service
        .update_product(
            &app_state.db_pool,
            product_id,
            &payload.name,
            payload.description.as_deref(),
            payload.sale_price,
            payload.parent_id,
            payload.units_per_parent,
        )
        .await?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id} (desativação; nunca remove fisicamente)
#[utoipa::path(
    delete,
    path = "/api/products/{product_id}",
    tag = "Products",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses((status = 204, description = "Produto desativado"))
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .stock_service
        .deactivate_product(&app_state.db_pool, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payload: Restock (entrada de estoque)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    #[schema(example = 24)]
    pub quantity: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "2.75")]
    pub unit_cost: Decimal,

    // Opcional: já reajusta o preço de venda junto com a entrada
    pub new_sale_price: Option<Decimal>,
}

// POST /api/products/{id}/restock
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/restock",
    tag = "Products",
    request_body = RestockPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Estoque e custo médio atualizados", body = crate::models::product::Product)
    )
)]
pub async fn restock(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<RestockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(price) = payload.new_sale_price {
        validate_not_negative(&price).map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("newSalePrice", e);
            AppError::ValidationError(errors)
        })?;
    }

    let product = app_state
        .stock_service
        .restock(
            &app_state.db_pool,
            product_id,
            payload.quantity,
            payload.unit_cost,
            payload.new_sale_price,
        )
        .await?;

    Ok((StatusCode::OK, Json(product)))
}

// ---
// Payload: Correção administrativa (erro de contagem)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,

    pub notes: Option<String>,
}

// POST /api/products/{id}/correction
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/correction",
    tag = "Products",
    request_body = CorrectionPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Estoque corrigido (sem lançar despesa)", body = crate::models::product::Product)
    )
)]
pub async fn correct_stock(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<CorrectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .stock_service
        .correct(
            &app_state.db_pool,
            product_id,
            payload.quantity,
            payload.notes.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(product)))
}

// ---
// Payload: Baixa com despesa (perda, vencimento, quebra)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteOffPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,

    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    #[schema(example = "Produto vencido")]
    pub reason: String,
}

// POST /api/products/{id}/write-off
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/write-off",
    tag = "Products",
    request_body = WriteOffPayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Baixa registrada com despesa em Perdas de Estoque", body = crate::models::product::Product)
    )
)]
pub async fn write_off(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<WriteOffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .stock_service
        .write_off(&app_state.db_pool, product_id, payload.quantity, &payload.reason)
        .await?;

    Ok((StatusCode::OK, Json(product)))
}

// ---
// Payload: Fracionamento (caixa -> unidades)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnbundlePayload {
    pub child_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade de caixas deve ser positiva."))]
    #[schema(example = 2)]
    pub case_count: i32,
}

#[derive(Debug, serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnbundleResponse {
    pub parent: crate::models::product::Product,
    pub child: crate::models::product::Product,
}

// POST /api/products/{id}/unbundle
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/unbundle",
    tag = "Products",
    request_body = UnbundlePayload,
    params(("product_id" = Uuid, Path, description = "ID do Produto caixa")),
    responses(
        (status = 200, description = "Caixas convertidas em unidades", body = UnbundleResponse)
    )
)]
pub async fn unbundle(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UnbundlePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (parent, child) = app_state
        .stock_service
        .unbundle(&app_state.db_pool, product_id, payload.child_id, payload.case_count)
        .await?;

    Ok((StatusCode::OK, Json(UnbundleResponse { parent, child })))
}

// GET /api/products/{id}/movements
#[utoipa::path(
    get,
    path = "/api/products/{product_id}/movements",
    tag = "Products",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Livro-razão de movimentações", body = [crate::models::product::StockMovement])
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state
        .stock_service
        .list_movements(product_id)
        .await?;
    Ok((StatusCode::OK, Json(movements)))
}
