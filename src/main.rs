//src/main.rs

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_product).get(handlers::products::get_all_products),
        )
        .route(
            "/{product_id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::deactivate_product),
        )
        .route("/{product_id}/restock", post(handlers::products::restock))
        .route("/{product_id}/correction", post(handlers::products::correct_stock))
        .route("/{product_id}/write-off", post(handlers::products::write_off))
        .route("/{product_id}/unbundle", post(handlers::products::unbundle))
        .route("/{product_id}/movements", get(handlers::products::list_movements))
        .route(
            "/{id}/plans",
            post(handlers::billing::create_plan).get(handlers::billing::get_plans_for_product),
        );

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::get_all_customers),
        )
        .route("/{id}/fiado-balance", get(handlers::billing::fiado_balance));

    let cart_routes = Router::new()
        .route(
            "/items",
            post(handlers::cart::add_cart_item).put(handlers::cart::update_cart_item),
        )
        .route(
            "/{customer_id}/items/{product_id}",
            delete(handlers::cart::remove_cart_item),
        )
        .route("/{customer_id}", get(handlers::cart::get_cart));

    let order_routes = Router::new()
        .route("/", get(handlers::orders::get_all_orders))
        .route("/checkout", post(handlers::orders::checkout))
        .route("/physical-sale", post(handlers::orders::physical_sale))
        .route("/{id}", get(handlers::orders::get_order))
        .route("/{id}/status", put(handlers::orders::update_order_status))
        .route("/{id}/cancel", post(handlers::orders::cancel_order))
        .route("/items/{item_id}", put(handlers::orders::update_order_item))
        .route("/{id}/installments", get(handlers::billing::list_installments))
        .route(
            "/{id}/fiado-payments",
            post(handlers::billing::record_fiado_payment)
                .get(handlers::billing::list_fiado_payments),
        );

    let comanda_routes = Router::new()
        .route(
            "/",
            post(handlers::comandas::open_comanda).get(handlers::comandas::get_all_comandas),
        )
        .route("/{id}", get(handlers::comandas::get_comanda))
        .route("/{id}/items", post(handlers::comandas::add_comanda_item))
        .route(
            "/items/{item_id}",
            put(handlers::comandas::update_comanda_item)
                .delete(handlers::comandas::remove_comanda_item),
        )
        .route("/{id}/close", post(handlers::comandas::close_comanda));

    let expense_routes = Router::new()
        .route(
            "/",
            post(handlers::expenses::create_expense).get(handlers::expenses::get_all_expenses),
        )
        .route(
            "/categories",
            post(handlers::expenses::create_category).get(handlers::expenses::get_all_categories),
        )
        .route("/categories/{id}", delete(handlers::expenses::delete_category));

    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/products", product_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/cart", cart_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/comandas", comanda_routes)
        .nest("/api/expenses", expense_routes)
        .route("/api/installments/{id}/pay", put(handlers::billing::pay_installment))
        .route("/api/fiado/bulk-payment", post(handlers::billing::bulk_fiado_payment))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
