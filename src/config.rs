// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{
        BillingRepository, ComandaRepository, CustomerRepository, ExpenseRepository,
        OrderRepository, ProductRepository,
    },
    services::{
        billing_service::BillingService, comanda_service::ComandaService,
        expense_service::ExpenseService, order_service::OrderService,
        stock_service::StockService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub customer_repo: CustomerRepository,
    pub stock_service: StockService,
    pub comanda_service: ComandaService,
    pub order_service: OrderService,
    pub billing_service: BillingService,
    pub expense_service: ExpenseService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let product_repo = ProductRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let comanda_repo = ComandaRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let billing_repo = BillingRepository::new(db_pool.clone());
        let expense_repo = ExpenseRepository::new(db_pool.clone());

        let stock_service = StockService::new(product_repo.clone(), expense_repo.clone());
        let billing_service = BillingService::new(billing_repo.clone(), order_repo.clone());
        let comanda_service =
            ComandaService::new(comanda_repo, order_repo.clone(), stock_service.clone());
        let order_service = OrderService::new(
            order_repo,
            customer_repo.clone(),
            billing_repo,
            stock_service.clone(),
            billing_service.clone(),
        );
        let expense_service = ExpenseService::new(expense_repo, product_repo);

        Ok(Self {
            db_pool,
            customer_repo,
            stock_service,
            comanda_service,
            order_service,
            billing_service,
            expense_service,
        })
    }
}
