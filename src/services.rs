pub mod billing_service;
pub mod comanda_service;
pub mod expense_service;
pub mod order_service;
pub mod stock_service;
