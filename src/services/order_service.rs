// src/services/order_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, CustomerRepository, OrderRepository},
    models::{
        order::{CancelledBy, Order, OrderDetail, OrderItem, OrderStatus, PaymentMethod},
        product::StockMovementReason,
    },
    services::{billing_service::BillingService, stock_service::StockService},
};

/// Item de venda presencial (sem carrinho persistido).
#[derive(Debug, Clone)]
pub struct SaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Troco de uma venda em dinheiro.
pub fn change_due(total: Decimal, cash_tendered: Decimal) -> Decimal {
    (cash_tendered - total).max(Decimal::ZERO)
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    customer_repo: CustomerRepository,
    billing_repo: BillingRepository,
    stock_service: StockService,
    billing_service: BillingService,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        customer_repo: CustomerRepository,
        billing_repo: BillingRepository,
        stock_service: StockService,
        billing_service: BillingService,
    ) -> Self {
        Self {
            order_repo,
            customer_repo,
            billing_repo,
            stock_service,
            billing_service,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Order>, AppError> {
        self.order_repo.get_all().await
    }

    pub async fn get_detail<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<OrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let order = self
            .order_repo
            .get_by_id(&mut *conn, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;
        let items = self.order_repo.list_items(&mut *conn, order_id).await?;

        Ok(OrderDetail { order, items })
    }

    // ---
    // CHECKOUT (carrinho -> pedido)
    // ---

    /// Converte o carrinho do cliente em um pedido: valida e baixa o
    /// estoque item a item, congela preço/custo, gera o carnê quando o
    /// pagamento é boleto virtual e limpa o carrinho. Tudo em uma transação.
    pub async fn checkout<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        payment_method: PaymentMethod,
        delivery_location: Option<&str>,
        plan_id: Option<Uuid>,
        due_day: Option<u32>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.customer_repo
            .get_by_id(&mut *tx, customer_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        let cart = self.customer_repo.get_cart(&mut *tx, customer_id).await?;
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let total_quantity: i32 = cart.iter().map(|i| i.quantity).sum();

        // Para boleto virtual o preço vem do plano escolhido, não do preço
        // de catálogo; todos os produtos do carrinho precisam ter ao menos
        // um plano cadastrado.
        let boleto = if payment_method == PaymentMethod::BoletoVirtual {
            let (plan_id, due_day) = match (plan_id, due_day) {
                (Some(p), Some(d)) => (p, d),
                _ => return Err(AppError::MissingInstallmentSelection),
            };

            for item in &cart {
                if !self.billing_repo.product_has_plan(&mut *tx, item.product_id).await? {
                    return Err(AppError::MissingInstallmentSelection);
                }
            }

            let plan = self
                .billing_repo
                .get_plan_by_id(&mut *tx, plan_id)
                .await?
                .ok_or(AppError::NotFound("Plano de parcelamento"))?;
            if plan.product_id != cart[0].product_id {
                return Err(AppError::MissingInstallmentSelection);
            }
            Some((plan, due_day))
        } else {
            None
        };

        // Baixa o estoque e congela preço/custo por item
        let mut lines = Vec::with_capacity(cart.len());
        for item in &cart {
            let product = self
                .stock_service
                .deduct_locked(
                    &mut tx,
                    item.product_id,
                    item.quantity,
                    StockMovementReason::Sale,
                    Some("Checkout"),
                )
                .await?;

            let unit_price = match &boleto {
                // Preço por unidade no boleto = total do plano por unidade
                Some((plan, _)) => plan.installment_value * Decimal::from(plan.installment_count),
                None => product.sale_price,
            };
            lines.push((item.product_id, item.quantity, unit_price, product.weighted_avg_cost));
        }

        let total: Decimal = lines
            .iter()
            .map(|(_, qty, price, _)| *price * Decimal::from(*qty))
            .sum();

        let status = if boleto.is_some() {
            OrderStatus::AwaitingInstallmentApproval
        } else {
            OrderStatus::Processing
        };

        let order = self
            .order_repo
            .create(
                &mut *tx,
                Some(customer_id),
                total,
                payment_method,
                None,
                delivery_location,
                status,
                None,
                None,
            )
            .await?;

        for (product_id, quantity, unit_price, unit_cost) in lines {
            self.order_repo
                .add_item(&mut *tx, order.id, product_id, quantity, unit_price, unit_cost)
                .await?;
        }

        if let Some((plan, due_day)) = boleto {
            self.billing_service
                .generate_installments(&mut tx, order.id, &plan, due_day, total_quantity)
                .await?;
        }

        self.customer_repo.clear_cart(&mut *tx, customer_id).await?;

        tx.commit().await?;
        Ok(order)
    }

    // ---
    // VENDA PRESENCIAL
    // ---

    /// Venda no balcão: sem fluxo de envio, o pedido já nasce Entregue.
    pub async fn physical_sale<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        items: &[SaleItem],
        payment_method: PaymentMethod,
        cash_tendered: Option<Decimal>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .stock_service
                .deduct_locked(
                    &mut tx,
                    item.product_id,
                    item.quantity,
                    StockMovementReason::Sale,
                    Some("Venda presencial"),
                )
                .await?;
            lines.push((item.product_id, item.quantity, product.sale_price, product.weighted_avg_cost));
        }

        let total: Decimal = lines
            .iter()
            .map(|(_, qty, price, _)| *price * Decimal::from(*qty))
            .sum();

        let (status, delivery_date) = if payment_method == PaymentMethod::Fiado {
            (OrderStatus::Fiado, None)
        } else {
            (OrderStatus::Delivered, Some(Utc::now()))
        };

        let order = self
            .order_repo
            .create(
                &mut *tx,
                customer_id,
                total,
                payment_method,
                None,
                None,
                status,
                cash_tendered,
                delivery_date,
            )
            .await?;

        for (product_id, quantity, unit_price, unit_cost) in lines {
            self.order_repo
                .add_item(&mut *tx, order.id, product_id, quantity, unit_price, unit_cost)
                .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    // ---
    // TRANSIÇÕES DE STATUS
    // ---

    /// Transição de status com a tabela de legalidade do enum. Repetir o
    /// status atual é um no-op de sucesso que não toca em nenhum campo.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .order_repo
            .get_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        if order.status == new_status {
            tx.commit().await?;
            return Ok(order);
        }

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Transição de {:?} para {:?} não é permitida.",
                order.status, new_status
            )));
        }

        match new_status {
            OrderStatus::Fiado => {
                self.order_repo
                    .set_status_fiado(&mut *tx, order_id, order.payment_method)
                    .await?;
            }
            OrderStatus::Delivered => {
                self.order_repo
                    .set_status(&mut *tx, order_id, new_status, Some(Utc::now()))
                    .await?;
            }
            _ => {
                self.order_repo
                    .set_status(&mut *tx, order_id, new_status, None)
                    .await?;
            }
        }

        let updated = self
            .order_repo
            .get_by_id(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Cancelamento pelo cliente: só nos estágios iniciais e só pelo dono
    /// do pedido. Devolve cada item ao estoque.
    pub async fn cancel_by_customer<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .order_repo
            .get_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        if order.customer_id != Some(customer_id) {
            return Err(AppError::Forbidden(
                "O pedido pertence a outro cliente.".into(),
            ));
        }
        if !matches!(
            order.status,
            OrderStatus::Processing | OrderStatus::AwaitingInstallmentApproval
        ) {
            return Err(AppError::InvalidStateTransition(
                "O pedido já saiu do estágio em que pode ser cancelado pelo cliente.".into(),
            ));
        }

        self.restitute_and_cancel(&mut tx, order_id, CancelledBy::Customer)
            .await?;

        let updated = self
            .order_repo
            .get_by_id(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Cancelamento administrativo: qualquer status exceto já-cancelado.
    /// O motivo é apenas registrado em log (notificação fica por conta de
    /// colaborador externo).
    pub async fn cancel_by_admin<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .order_repo
            .get_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        if order.status == OrderStatus::Cancelled {
            return Err(AppError::InvalidStateTransition(
                "O pedido já está cancelado.".into(),
            ));
        }

        if let Some(reason) = reason {
            tracing::info!("Pedido {} cancelado pelo admin: {}", order_id, reason);
        }

        self.restitute_and_cancel(&mut tx, order_id, CancelledBy::Admin)
            .await?;

        let updated = self
            .order_repo
            .get_by_id(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn restitute_and_cancel(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order_id: Uuid,
        cancelled_by: CancelledBy,
    ) -> Result<(), AppError> {
        let items = self.order_repo.list_items(&mut **tx, order_id).await?;
        for item in &items {
            self.stock_service
                .restore_locked(tx, item.product_id, item.quantity, Some("Cancelamento de pedido"))
                .await?;
        }
        self.order_repo.set_cancelled(&mut **tx, order_id, cancelled_by).await?;
        Ok(())
    }

    // ---
    // CORREÇÃO DE ITENS
    // ---

    /// Ajusta a quantidade de um item do pedido aplicando o delta ao
    /// estoque; quantidade zero remove a linha. O total do pedido é
    /// recalculado a partir das linhas restantes.
    pub async fn update_item_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        new_quantity: i32,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let item = self
            .order_repo
            .get_item_for_update(&mut *tx, item_id)
            .await?
            .ok_or(AppError::NotFound("Item do pedido"))?;

        let order = self
            .order_repo
            .get_for_update(&mut *tx, item.order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;
        if order.status == OrderStatus::Cancelled {
            return Err(AppError::InvalidStateTransition(
                "Pedido cancelado não aceita ajustes de itens.".into(),
            ));
        }

        let delta = new_quantity - item.quantity;
        if delta > 0 {
            self.stock_service
                .deduct_locked(
                    &mut tx,
                    item.product_id,
                    delta,
                    StockMovementReason::Sale,
                    Some("Ajuste de item do pedido"),
                )
                .await?;
        } else if delta < 0 {
            self.stock_service
                .restore_locked(&mut tx, item.product_id, -delta, Some("Ajuste de item do pedido"))
                .await?;
        }

        if new_quantity == 0 {
            self.order_repo.delete_item(&mut *tx, item_id).await?;
        } else {
            self.order_repo
                .set_item_quantity(&mut *tx, item_id, new_quantity)
                .await?;
        }

        let new_total = self.order_repo.recalculate_total(&mut *tx, item.order_id).await?;

        tx.commit().await?;
        Ok(new_total)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.order_repo.list_items(executor, order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::change_due;
    use rust_decimal::dec;

    #[test]
    fn change_is_tender_minus_total() {
        assert_eq!(change_due(dec!(37.50), dec!(50.00)), dec!(12.50));
    }

    #[test]
    fn exact_tender_gives_no_change() {
        assert_eq!(change_due(dec!(20.00), dec!(20.00)), dec!(0.00));
    }

    #[test]
    fn change_never_goes_negative() {
        assert_eq!(change_due(dec!(30.00), dec!(10.00)), dec!(0));
    }
}
