// src/docs.rs

use crate::handlers;
use crate::models;
use crate::services;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Products ---
        handlers::products::create_product,
        handlers::products::get_all_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::deactivate_product,
        handlers::products::restock,
        handlers::products::correct_stock,
        handlers::products::write_off,
        handlers::products::unbundle,
        handlers::products::list_movements,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::get_all_customers,

        // --- Cart ---
        handlers::cart::add_cart_item,
        handlers::cart::update_cart_item,
        handlers::cart::remove_cart_item,
        handlers::cart::get_cart,

        // --- Orders ---
        handlers::orders::get_all_orders,
        handlers::orders::get_order,
        handlers::orders::checkout,
        handlers::orders::physical_sale,
        handlers::orders::update_order_status,
        handlers::orders::cancel_order,
        handlers::orders::update_order_item,

        // --- Comandas ---
        handlers::comandas::open_comanda,
        handlers::comandas::get_all_comandas,
        handlers::comandas::get_comanda,
        handlers::comandas::add_comanda_item,
        handlers::comandas::update_comanda_item,
        handlers::comandas::remove_comanda_item,
        handlers::comandas::close_comanda,

        // --- Billing ---
        handlers::billing::create_plan,
        handlers::billing::get_plans_for_product,
        handlers::billing::list_installments,
        handlers::billing::pay_installment,
        handlers::billing::record_fiado_payment,
        handlers::billing::list_fiado_payments,
        handlers::billing::bulk_fiado_payment,
        handlers::billing::fiado_balance,

        // --- Expenses ---
        handlers::expenses::create_category,
        handlers::expenses::get_all_categories,
        handlers::expenses::delete_category,
        handlers::expenses::create_expense,
        handlers::expenses::get_all_expenses,
    ),
    components(
        schemas(
            // --- Products ---
            models::product::Product,
            models::product::StockMovementReason,
            models::product::StockMovement,
            handlers::products::CreateProductPayload,
            handlers::products::RestockPayload,
            handlers::products::CorrectionPayload,
            handlers::products::WriteOffPayload,
            handlers::products::UnbundlePayload,
            handlers::products::UnbundleResponse,

            // --- Customers / Cart ---
            models::customer::Customer,
            models::customer::CartItem,
            handlers::customers::CreateCustomerPayload,
            handlers::cart::CartItemPayload,

            // --- Orders ---
            models::order::OrderStatus,
            models::order::PaymentMethod,
            models::order::CancelledBy,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderDetail,
            handlers::orders::CheckoutPayload,
            handlers::orders::SaleItemPayload,
            handlers::orders::PhysicalSalePayload,
            handlers::orders::PhysicalSaleResponse,
            handlers::orders::UpdateStatusPayload,
            handlers::orders::CancelOrderPayload,
            handlers::orders::UpdateItemQuantityPayload,
            handlers::orders::OrderTotalResponse,

            // --- Comandas ---
            models::comanda::ComandaStatus,
            models::comanda::Comanda,
            models::comanda::ComandaItem,
            models::comanda::ComandaDetail,
            handlers::comandas::OpenComandaPayload,
            handlers::comandas::ComandaItemPayload,
            handlers::comandas::UpdateComandaItemPayload,
            handlers::comandas::CloseComandaPayload,

            // --- Billing ---
            models::billing::InstallmentStatus,
            models::billing::InstallmentPlan,
            models::billing::Installment,
            models::billing::FiadoPayment,
            handlers::billing::CreatePlanPayload,
            handlers::billing::FiadoPaymentPayload,
            handlers::billing::BulkFiadoPaymentPayload,
            handlers::billing::FiadoBalanceResponse,
            services::billing_service::BulkAllocationResult,

            // --- Expenses ---
            models::expense::ExpenseCategory,
            models::expense::Expense,
            handlers::expenses::CreateCategoryPayload,
            handlers::expenses::CreateExpensePayload,
        )
    ),
    tags(
        (name = "Products", description = "Catálogo e Gestão de Estoque"),
        (name = "Customers", description = "Cadastro de Clientes"),
        (name = "Cart", description = "Carrinho de Compras"),
        (name = "Orders", description = "Pedidos, Checkout e Vendas"),
        (name = "Comandas", description = "Comandas (consumo aberto no balcão)"),
        (name = "Billing", description = "Boleto Parcelado e Fiado"),
        (name = "Expenses", description = "Despesas e Categorias")
    )
)]
pub struct ApiDoc;
