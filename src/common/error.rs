// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante mapeia para uma classe HTTP no IntoResponse abaixo;
// nenhuma falha é engolida: quem detecta o erro dentro de uma transação
// deixa o rollback acontecer (drop da Transaction) antes de propagar.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Estoque insuficiente: disponível {available}")]
    InsufficientStock { available: i32 },

    #[error("Transição de estado inválida: {0}")]
    InvalidStateTransition(String),

    #[error("Pagamento excede o saldo devedor")]
    ExceedsBalance,

    #[error("Parcela já está paga")]
    InstallmentAlreadyPaid,

    #[error("Carrinho vazio")]
    EmptyCart,

    #[error("Comanda sem itens")]
    EmptyComanda,

    #[error("Pagamento por boleto exige plano e dia de vencimento")]
    MissingInstallmentSelection,

    #[error("{0} já existe")]
    Conflict(String),

    #[error("Registro em uso por outros cadastros")]
    ForeignKeyInUse,

    #[error("Operação não permitida: {0}")]
    Forbidden(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::NotFound(entity) => {
                let body = Json(json!({ "error": format!("{entity} não encontrado(a).") }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }

            AppError::InsufficientStock { available } => {
                let body = Json(json!({
                    "error": format!("Estoque insuficiente. Disponível: {available}."),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::InvalidStateTransition(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::Conflict(what) => {
                let body = Json(json!({ "error": format!("{what} já existe.") }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::Forbidden(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }

            AppError::ExceedsBalance => (
                StatusCode::BAD_REQUEST,
                "O valor informado excede o saldo devedor do pedido.",
            ),
            AppError::InstallmentAlreadyPaid => {
                (StatusCode::BAD_REQUEST, "Esta parcela já foi paga.")
            }
            AppError::EmptyCart => (StatusCode::BAD_REQUEST, "O carrinho está vazio."),
            AppError::EmptyComanda => (
                StatusCode::BAD_REQUEST,
                "A comanda não possui itens para fechamento.",
            ),
            AppError::MissingInstallmentSelection => (
                StatusCode::BAD_REQUEST,
                "Selecione um plano de parcelamento e o dia de vencimento.",
            ),
            AppError::ForeignKeyInUse => (
                StatusCode::CONFLICT,
                "Este registro está em uso e não pode ser removido.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
