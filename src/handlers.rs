pub mod billing;
pub mod cart;
pub mod comandas;
pub mod customers;
pub mod expenses;
pub mod orders;
pub mod products;
