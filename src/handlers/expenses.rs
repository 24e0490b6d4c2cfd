// src/handlers/expenses.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{common::error::AppError, config::AppState};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Energia Elétrica")]
    pub name: String,
}

// Ou a despesa traz o valor pronto, ou traz produto + quantidade e o
// valor é calculado na baixa de estoque.
fn validate_expense_shape(payload: &CreateExpensePayload) -> Result<(), ValidationError> {
    let write_off = payload.product_id.is_some() || payload.stock_write_off_quantity.is_some();
    if write_off && (payload.product_id.is_none() || payload.stock_write_off_quantity.is_none()) {
        let mut err = ValidationError::new("write_off");
        err.message = Some("Baixa de estoque exige produto e quantidade juntos.".into());
        return Err(err);
    }
    if !write_off && payload.amount.is_none() {
        let mut err = ValidationError::new("amount");
        err.message = Some("Informe o valor da despesa.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_expense_shape"))]
pub struct CreateExpensePayload {
    pub category_id: Uuid,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[schema(example = "Conta de luz de agosto")]
    pub description: String,

    #[schema(example = "230.45")]
    pub amount: Option<Decimal>,

    pub expense_date: Option<NaiveDate>,

    // Preenchidos apenas para despesa de baixa de estoque
    pub product_id: Option<Uuid>,

    #[validate(range(min = 1, message = "A quantidade de baixa deve ser ao menos 1."))]
    pub stock_write_off_quantity: Option<i32>,
}

// ---
// Handlers
// ---

// POST /api/expenses/categories
#[utoipa::path(
    post,
    path = "/api/expenses/categories",
    tag = "Expenses",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = crate::models::expense::ExpenseCategory),
        (status = 409, description = "Já existe categoria com esse nome")
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .expense_service
        .create_category(&app_state.db_pool, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/expenses/categories
#[utoipa::path(
    get,
    path = "/api/expenses/categories",
    tag = "Expenses",
    responses(
        (status = 200, description = "Categorias de despesa", body = [crate::models::expense::ExpenseCategory])
    )
)]
pub async fn get_all_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.expense_service.get_all_categories().await?;
    Ok((StatusCode::OK, Json(categories)))
}

// DELETE /api/expenses/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/expenses/categories/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "ID da Categoria")),
    responses(
        (status = 204, description = "Categoria removida"),
        (status = 409, description = "Categoria protegida ou em uso por despesas")
    )
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .expense_service
        .delete_category(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/expenses
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, description = "Despesa registrada", body = crate::models::expense::Expense),
        (status = 400, description = "Estoque insuficiente para a baixa")
    )
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let expense = app_state
        .expense_service
        .create_expense(
            &app_state.db_pool,
            payload.category_id,
            &payload.description,
            payload.amount,
            payload.expense_date,
            payload.product_id,
            payload.stock_write_off_quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

// GET /api/expenses
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    responses(
        (status = 200, description = "Despesas registradas", body = [crate::models::expense::Expense])
    )
)]
pub async fn get_all_expenses(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = app_state.expense_service.get_all_expenses().await?;
    Ok((StatusCode::OK, Json(expenses)))
}
