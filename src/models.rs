pub mod billing;
pub mod comanda;
pub mod customer;
pub mod expense;
pub mod order;
pub mod product;
