pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod comanda_repo;
pub use comanda_repo::ComandaRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
