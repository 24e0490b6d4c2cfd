// src/services/comanda_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ComandaRepository, OrderRepository},
    models::{
        comanda::{Comanda, ComandaDetail, ComandaItem, ComandaStatus},
        order::{Order, OrderStatus, PaymentMethod},
        product::StockMovementReason,
    },
    services::stock_service::StockService,
};

/// Total da comanda: soma de preço congelado × quantidade de cada linha.
pub fn comanda_total(items: &[ComandaItem]) -> Decimal {
    items
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum()
}

#[derive(Clone)]
pub struct ComandaService {
    comanda_repo: ComandaRepository,
    order_repo: OrderRepository,
    stock_service: StockService,
}

impl ComandaService {
    pub fn new(
        comanda_repo: ComandaRepository,
        order_repo: OrderRepository,
        stock_service: StockService,
    ) -> Self {
        Self {
            comanda_repo,
            order_repo,
            stock_service,
        }
    }

    pub async fn open<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        walkin_name: Option<&str>,
    ) -> Result<Comanda, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.comanda_repo.create(executor, customer_id, walkin_name).await
    }

    pub async fn get_all(&self) -> Result<Vec<Comanda>, AppError> {
        self.comanda_repo.get_all().await
    }

    pub async fn get_detail<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
    ) -> Result<ComandaDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let comanda = self
            .comanda_repo
            .get_by_id(&mut *conn, comanda_id)
            .await?
            .ok_or(AppError::NotFound("Comanda"))?;
        let items = self.comanda_repo.list_items(&mut *conn, comanda_id).await?;

        Ok(ComandaDetail { comanda, items })
    }

    /// Lança um item na comanda. A baixa de estoque acontece imediatamente
    /// (invariante: soma das quantidades da comanda == estoque já deduzido
    /// por ela); preço e custo são congelados no momento do lançamento.
    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<ComandaItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let comanda = self
            .comanda_repo
            .get_for_update(&mut *tx, comanda_id)
            .await?
            .ok_or(AppError::NotFound("Comanda"))?;

        if comanda.status != ComandaStatus::Open {
            return Err(AppError::InvalidStateTransition(
                "A comanda já está fechada.".into(),
            ));
        }

        let product = self
            .stock_service
            .deduct_locked(
                &mut tx,
                product_id,
                quantity,
                StockMovementReason::TabItem,
                Some("Lançamento em comanda"),
            )
            .await?;

        // Produto repetido soma quantidades na mesma linha (UPSERT);
        // o snapshot de preço/custo do primeiro lançamento é mantido.
        let item = self
            .comanda_repo
            .upsert_item(
                &mut *tx,
                comanda_id,
                product_id,
                quantity,
                product.sale_price,
                product.weighted_avg_cost,
            )
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    /// Ajusta a quantidade de um item aplicando o delta ao estoque:
    /// devolve ao diminuir, deduz ao aumentar.
    pub async fn update_item_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        new_quantity: i32,
    ) -> Result<ComandaItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let item = self
            .comanda_repo
            .get_item_for_update(&mut *tx, item_id)
            .await?
            .ok_or(AppError::NotFound("Item da comanda"))?;

        let comanda = self
            .comanda_repo
            .get_for_update(&mut *tx, item.comanda_id)
            .await?
            .ok_or(AppError::NotFound("Comanda"))?;
        if comanda.status != ComandaStatus::Open {
            return Err(AppError::InvalidStateTransition(
                "A comanda já está fechada.".into(),
            ));
        }

        let delta = new_quantity - item.quantity;
        if delta > 0 {
            self.stock_service
                .deduct_locked(
                    &mut tx,
                    item.product_id,
                    delta,
                    StockMovementReason::TabItem,
                    Some("Ajuste de item em comanda"),
                )
                .await?;
        } else if delta < 0 {
            self.stock_service
                .restore_locked(&mut tx, item.product_id, -delta, Some("Ajuste de item em comanda"))
                .await?;
        }

        let updated = self
            .comanda_repo
            .set_item_quantity(&mut *tx, item_id, new_quantity)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a linha devolvendo a quantidade inteira ao estoque.
    pub async fn remove_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let item = self
            .comanda_repo
            .get_item_for_update(&mut *tx, item_id)
            .await?
            .ok_or(AppError::NotFound("Item da comanda"))?;

        let comanda = self
            .comanda_repo
            .get_for_update(&mut *tx, item.comanda_id)
            .await?
            .ok_or(AppError::NotFound("Comanda"))?;
        if comanda.status != ComandaStatus::Open {
            return Err(AppError::InvalidStateTransition(
                "A comanda já está fechada.".into(),
            ));
        }

        self.stock_service
            .restore_locked(&mut tx, item.product_id, item.quantity, Some("Item removido da comanda"))
            .await?;
        self.comanda_repo.delete_item(&mut *tx, item_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// A única ponte do estado "em andamento" para o estado "pedido
    /// comprometido". Ou o Pedido + itens + virada de status acontecem
    /// juntos, ou nada acontece.
    pub async fn close<'e, E>(
        &self,
        executor: E,
        comanda_id: Uuid,
        payment_method: PaymentMethod,
        cash_tendered: Option<Decimal>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // O lock da linha impede dois fechamentos concorrentes: o segundo
        // enxerga status CLOSED e falha.
        let comanda = self
            .comanda_repo
            .get_for_update(&mut *tx, comanda_id)
            .await?
            .ok_or(AppError::NotFound("Comanda"))?;

        if comanda.status != ComandaStatus::Open {
            return Err(AppError::InvalidStateTransition(
                "A comanda já está fechada.".into(),
            ));
        }

        let items = self.comanda_repo.list_items(&mut *tx, comanda_id).await?;
        if items.is_empty() {
            return Err(AppError::EmptyComanda);
        }

        let total = comanda_total(&items);

        // Fiado fica em aberto, sem data de entrega; qualquer outro método
        // já sai como entregue (venda presencial).
        let (status, original_pm, pm, delivery_date) = if payment_method == PaymentMethod::Fiado {
            (OrderStatus::Fiado, None, PaymentMethod::Fiado, None)
        } else {
            (OrderStatus::Delivered, None, payment_method, Some(Utc::now()))
        };

        let order = self
            .order_repo
            .create(
                &mut *tx,
                comanda.customer_id,
                total,
                pm,
                original_pm,
                None,
                status,
                cash_tendered,
                delivery_date,
            )
            .await?;

        // Copia cada linha 1:1 preservando quantidade, preço e custo
        for item in &items {
            self.order_repo
                .add_item(
                    &mut *tx,
                    order.id,
                    item.product_id,
                    item.quantity,
                    item.unit_price,
                    item.unit_cost,
                )
                .await?;
        }

        self.comanda_repo
            .set_status(&mut *tx, comanda_id, ComandaStatus::Closed)
            .await?;

        tx.commit().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn item(quantity: i32, unit_price: Decimal) -> ComandaItem {
        ComandaItem {
            id: Uuid::new_v4(),
            comanda_id: Uuid::from_u128(1),
            product_id: Uuid::new_v4(),
            quantity,
            unit_price,
            unit_cost: dec!(1.00),
        }
    }

    #[test]
    fn total_sums_frozen_price_times_quantity() {
        // 3 × 4.50 + 2 × 10.00 = 33.50
        let items = vec![item(3, dec!(4.50)), item(2, dec!(10.00))];
        assert_eq!(comanda_total(&items), dec!(33.50));
    }

    #[test]
    fn total_uses_the_snapshot_not_the_catalog() {
        // O preço congelado na linha manda, mesmo que o catálogo mude depois
        let items = vec![item(1, dec!(7.25))];
        assert_eq!(comanda_total(&items), dec!(7.25));
    }

    #[test]
    fn total_of_empty_comanda_is_zero() {
        assert_eq!(comanda_total(&[]), Decimal::ZERO);
    }
}
