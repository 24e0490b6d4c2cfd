// src/handlers/billing.rs

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
use validator::{Validate, ValidationError};

use crate::{common::error::AppError, config::AppState};

// ---
// Payloads
// ---

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanPayload {
    #[validate(range(min = 1, message = "O número de parcelas deve ser ao menos 1."))]
    #[schema(example = 12)]
    pub installment_count: i32,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "89.90")]
    pub installment_value: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiadoPaymentPayload {
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "50.00")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkFiadoPaymentPayload {
    pub customer_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "200.00")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiadoBalanceResponse {
    pub customer_id: Uuid,
    pub balance: Decimal,
}

// ---
// Planos de parcelamento
// ---

// POST /api/products/{id}/plans
#[utoipa::path(
    post,
    path = "/api/products/{id}/plans",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Produto")),
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano cadastrado", body = crate::models::billing::InstallmentPlan)
    )
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // O plano só faz sentido para produto existente
    app_state
        .stock_service
        .get_product(&app_state.db_pool, id)
        .await?;

    let plan = app_state
        .billing_service
        .create_plan(
            &app_state.db_pool,
            id,
            payload.installment_count,
            payload.installment_value,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// GET /api/products/{id}/plans
#[utoipa::path(
    get,
    path = "/api/products/{id}/plans",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Planos do produto", body = [crate::models::billing::InstallmentPlan])
    )
)]
pub async fn get_plans_for_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let plans = app_state
        .billing_service
        .get_plans_for_product(id)
        .await?;
    Ok((StatusCode::OK, Json(plans)))
}

// ---
// Carnê (parcelas de boleto)
// ---

// GET /api/orders/{id}/installments
#[utoipa::path(
    get,
    path = "/api/orders/{id}/installments",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    responses(
        (status = 200, description = "Parcelas do pedido", body = [crate::models::billing::Installment])
    )
)]
pub async fn list_installments(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let installments = app_state
        .billing_service
        .list_installments(id)
        .await?;
    Ok((StatusCode::OK, Json(installments)))
}

// PUT /api/installments/{id}/pay
#[utoipa::path(
    put,
    path = "/api/installments/{id}/pay",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID da Parcela")),
    responses(
        (status = 200, description = "Parcela quitada", body = crate::models::billing::Installment),
        (status = 400, description = "Parcela já estava paga")
    )
)]
pub async fn pay_installment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let installment = app_state
        .billing_service
        .mark_installment_paid(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(installment)))
}

// ---
// Fiado
// ---

// POST /api/orders/{id}/fiado-payments
#[utoipa::path(
    post,
    path = "/api/orders/{id}/fiado-payments",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    request_body = FiadoPaymentPayload,
    responses(
        (status = 201, description = "Abatimento registrado", body = crate::models::billing::FiadoPayment),
        (status = 400, description = "Valor excede o saldo devedor ou pedido não está em fiado")
    )
)]
pub async fn record_fiado_payment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FiadoPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state
        .billing_service
        .record_fiado_payment(&app_state.db_pool, id, payload.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/orders/{id}/fiado-payments
#[utoipa::path(
    get,
    path = "/api/orders/{id}/fiado-payments",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Pedido")),
    responses(
        (status = 200, description = "Abatimentos do pedido", body = [crate::models::billing::FiadoPayment])
    )
)]
pub async fn list_fiado_payments(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let payments = app_state
        .billing_service
        .list_fiado_payments(id)
        .await?;
    Ok((StatusCode::OK, Json(payments)))
}

// POST /api/fiado/bulk-payment (distribui FIFO entre os pedidos abertos)
#[utoipa::path(
    post,
    path = "/api/fiado/bulk-payment",
    tag = "Billing",
    request_body = BulkFiadoPaymentPayload,
    responses(
        (status = 200, description = "Pagamento distribuído entre os fiados mais antigos", body = crate::services::billing_service::BulkAllocationResult)
    )
)]
pub async fn bulk_fiado_payment(
    State(app_state): State<AppState>,
    Json(payload): Json<BulkFiadoPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .billing_service
        .allocate_bulk_payment(&app_state.db_pool, payload.customer_id, payload.amount)
        .await?;
    Ok((StatusCode::OK, Json(result)))
}

// GET /api/customers/{id}/fiado-balance
#[utoipa::path(
    get,
    path = "/api/customers/{id}/fiado-balance",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    responses(
        (status = 200, description = "Saldo devedor consolidado", body = FiadoBalanceResponse)
    )
)]
pub async fn fiado_balance(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state
        .billing_service
        .fiado_balance(&app_state.db_pool, id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(FiadoBalanceResponse {
            customer_id: id,
            balance,
        }),
    ))
}
