// src/services/stock_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ExpenseRepository, ProductRepository},
    models::product::{Product, StockMovement, StockMovementReason},
};

/// Fórmula do custo médio ponderado: o custo de cada unidade é a mistura,
/// proporcional à quantidade, de todas as camadas de custo já recebidas.
pub fn blended_average_cost(
    current_qty: i32,
    current_avg: Decimal,
    incoming_qty: i32,
    incoming_cost: Decimal,
) -> Decimal {
    let current_value = Decimal::from(current_qty) * current_avg;
    let incoming_value = Decimal::from(incoming_qty) * incoming_cost;
    let new_total_qty = Decimal::from(current_qty + incoming_qty);

    if new_total_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current_value + incoming_value) / new_total_qty
}

/// Quantidade restante após uma saída, ou `InsufficientStock` com o
/// disponível quando o pedido excede o estoque. O estoque nunca fica
/// negativo: pedir exatamente o disponível zera.
pub fn checked_deduct(stock_quantity: i32, requested: i32) -> Result<i32, AppError> {
    if stock_quantity < requested {
        return Err(AppError::InsufficientStock {
            available: stock_quantity,
        });
    }
    Ok(stock_quantity - requested)
}

/// Resolve a configuração de fracionamento de um par caixa/unidade: o
/// filho aponta para o pai via `parent_id`, e é o PAI que declara quantas
/// unidades cada caixa rende.
pub fn units_per_case(parent: &Product, child: &Product) -> Result<i32, AppError> {
    if child.parent_id != Some(parent.id) {
        return Err(AppError::InvalidStateTransition(
            "O produto informado não é fração deste produto.".into(),
        ));
    }
    parent.units_per_parent.ok_or_else(|| {
        AppError::InvalidStateTransition("Produto sem configuração de fracionamento.".into())
    })
}

#[derive(Clone)]
pub struct StockService {
    product_repo: ProductRepository,
    expense_repo: ExpenseRepository,
}

impl StockService {
    pub fn new(product_repo: ProductRepository, expense_repo: ExpenseRepository) -> Self {
        Self {
            product_repo,
            expense_repo,
        }
    }

    // ---
    // Catálogo
    // ---

    pub async fn get_all_products(&self) -> Result<Vec<Product>, AppError> {
        self.product_repo.get_all().await
    }

    pub async fn get_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo
            .get_by_id(executor, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        sale_price: Decimal,
        parent_id: Option<Uuid>,
        units_per_parent: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo
            .create(executor, name, description, sale_price, parent_id, units_per_parent)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        name: &str,
        description: Option<&str>,
        sale_price: Decimal,
        parent_id: Option<Uuid>,
        units_per_parent: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo
            .update_details(executor, product_id, name, description, sale_price, parent_id, units_per_parent)
            .await
    }

    pub async fn deactivate_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo.deactivate(executor, product_id).await
    }

    pub async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        self.product_repo.list_movements(product_id).await
    }

    // ---
    // ENTRADA (reposição de estoque)
    // ---

    pub async fn restock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity: i32,
        unit_cost: Decimal,
        new_sale_price: Option<Decimal>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .product_repo
            .get_for_update(&mut *tx, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let new_qty = product.stock_quantity + quantity;
        let new_avg = blended_average_cost(
            product.stock_quantity,
            product.weighted_avg_cost,
            quantity,
            unit_cost,
        );
        let new_total = Decimal::from(new_qty) * new_avg;

        let updated = self
            .product_repo
            .update_stock(&mut *tx, product_id, new_qty, new_avg, new_total, new_sale_price)
            .await?;

        self.product_repo
            .record_movement(
                &mut *tx,
                product_id,
                quantity,
                StockMovementReason::Restock,
                Some(unit_cost),
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // ---
    // SAÍDA (venda, comanda, correção, baixa)
    // ---

    /// Baixa de estoque dentro de uma transação já aberta. O custo médio
    /// não muda numa saída; apenas o custo total é recomputado na média
    /// vigente.
    pub async fn deduct_locked(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        product_id: Uuid,
        quantity: i32,
        reason: StockMovementReason,
        notes: Option<&str>,
    ) -> Result<Product, AppError> {
        let product = self
            .product_repo
            .get_for_update(&mut **tx, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let new_qty = checked_deduct(product.stock_quantity, quantity)?;
        let new_total = Decimal::from(new_qty) * product.weighted_avg_cost;

        let updated = self
            .product_repo
            .update_stock(&mut **tx, product_id, new_qty, product.weighted_avg_cost, new_total, None)
            .await?;

        self.product_repo
            .record_movement(&mut **tx, product_id, -quantity, reason, None, notes)
            .await?;

        Ok(updated)
    }

    /// Inverso da baixa: devolve unidades ao estoque (cancelamentos).
    /// Assume que o estoque devolvido é fungível com o restante, então a
    /// média permanece a mesma.
    pub async fn restore_locked(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        product_id: Uuid,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<Product, AppError> {
        let product = self
            .product_repo
            .get_for_update(&mut **tx, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let new_qty = product.stock_quantity + quantity;
        let new_total = Decimal::from(new_qty) * product.weighted_avg_cost;

        let updated = self
            .product_repo
            .update_stock(&mut **tx, product_id, new_qty, product.weighted_avg_cost, new_total, None)
            .await?;

        self.product_repo
            .record_movement(&mut **tx, product_id, quantity, StockMovementReason::Return, None, notes)
            .await?;

        Ok(updated)
    }

    /// Correção administrativa (erro de contagem). Comporta-se como uma
    /// baixa, mas nunca vira Despesa.
    pub async fn correct<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity_to_remove: i32,
        notes: Option<&str>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let updated = self
            .deduct_locked(&mut tx, product_id, quantity_to_remove, StockMovementReason::Correction, notes)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Baixa com registro contábil: além de deduzir o estoque, lança uma
    /// Despesa de `quantidade × custo médio vigente` na categoria protegida
    /// "Perdas de Estoque".
    pub async fn write_off<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity: i32,
        reason_text: &str,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .product_repo
            .get_for_update(&mut *tx, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let new_qty = checked_deduct(product.stock_quantity, quantity)?;
        let new_total = Decimal::from(new_qty) * product.weighted_avg_cost;
        let loss = Decimal::from(quantity) * product.weighted_avg_cost;

        let updated = self
            .product_repo
            .update_stock(&mut *tx, product_id, new_qty, product.weighted_avg_cost, new_total, None)
            .await?;

        self.product_repo
            .record_movement(
                &mut *tx,
                product_id,
                -quantity,
                StockMovementReason::WriteOff,
                None,
                Some(reason_text),
            )
            .await?;

        let category = self.expense_repo.get_write_off_category(&mut *tx).await?;
        self.expense_repo
            .create_expense(
                &mut *tx,
                category.id,
                reason_text,
                loss,
                Utc::now().date_naive(),
                Some(product_id),
                Some(quantity),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // ---
    // FRACIONAMENTO (caixa -> unidades)
    // ---

    /// Converte `case_count` caixas do produto pai em unidades do produto
    /// filho. Cada unidade entra no filho custada a `média do pai ÷
    /// unidades por caixa`, misturada à média existente do filho pela mesma
    /// fórmula da reposição.
    pub async fn unbundle<'e, E>(
        &self,
        executor: E,
        parent_id: Uuid,
        child_id: Uuid,
        case_count: i32,
    ) -> Result<(Product, Product), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let parent = self
            .product_repo
            .get_for_update(&mut *tx, parent_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let child = self
            .product_repo
            .get_for_update(&mut *tx, child_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let units_per_parent = units_per_case(&parent, &child)?;

        // Saída do pai: média intacta
        let parent_qty = checked_deduct(parent.stock_quantity, case_count)?;
        let parent_total = Decimal::from(parent_qty) * parent.weighted_avg_cost;
        let updated_parent = self
            .product_repo
            .update_stock(&mut *tx, parent.id, parent_qty, parent.weighted_avg_cost, parent_total, None)
            .await?;
        self.product_repo
            .record_movement(
                &mut *tx,
                parent.id,
                -case_count,
                StockMovementReason::UnbundleOut,
                None,
                None,
            )
            .await?;

        // Entrada no filho: custo unitário derivado do pai, média misturada
        let moved_units = case_count * units_per_parent;
        let child_unit_cost = parent.weighted_avg_cost / Decimal::from(units_per_parent);
        let child_avg = blended_average_cost(
            child.stock_quantity,
            child.weighted_avg_cost,
            moved_units,
            child_unit_cost,
        );
        let child_qty = child.stock_quantity + moved_units;
        let child_total = Decimal::from(child_qty) * child_avg;

        let updated_child = self
            .product_repo
            .update_stock(&mut *tx, child.id, child_qty, child_avg, child_total, None)
            .await?;
        self.product_repo
            .record_movement(
                &mut *tx,
                child.id,
                moved_units,
                StockMovementReason::UnbundleIn,
                Some(child_unit_cost),
                None,
            )
            .await?;

        tx.commit().await?;
        Ok((updated_parent, updated_child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn blends_costs_proportionally_to_quantity() {
        // 10 un a 2.00 + 10 un a 4.00 => média 3.00
        let avg = blended_average_cost(10, dec!(2.00), 10, dec!(4.00));
        assert_eq!(avg, dec!(3.00));
    }

    #[test]
    fn restock_into_empty_stock_takes_incoming_cost() {
        let avg = blended_average_cost(0, Decimal::ZERO, 5, dec!(7.30));
        assert_eq!(avg, dec!(7.30));
    }

    #[test]
    fn uneven_quantities_weight_the_blend() {
        // 30 un a 1.00 + 10 un a 5.00 => (30 + 50) / 40 = 2.00
        let avg = blended_average_cost(30, dec!(1.00), 10, dec!(5.00));
        assert_eq!(avg, dec!(2.00));
    }

    #[test]
    fn zero_total_quantity_yields_zero() {
        assert_eq!(blended_average_cost(0, dec!(9.99), 0, dec!(1.00)), Decimal::ZERO);
    }

    #[test]
    fn total_cost_identity_holds_after_blend() {
        let (old_qty, old_avg) = (12, dec!(2.50));
        let (in_qty, in_cost) = (8, dec!(4.75));
        let avg = blended_average_cost(old_qty, old_avg, in_qty, in_cost);
        let total = Decimal::from(old_qty + in_qty) * avg;
        let expected = Decimal::from(old_qty) * old_avg + Decimal::from(in_qty) * in_cost;
        assert_eq!(total, expected);
    }

    #[test]
    fn deduct_within_stock_leaves_remainder() {
        assert_eq!(checked_deduct(10, 3).unwrap(), 7);
    }

    #[test]
    fn deduct_of_entire_stock_zeroes_without_going_negative() {
        assert_eq!(checked_deduct(5, 5).unwrap(), 0);
    }

    #[test]
    fn deduct_beyond_stock_reports_available() {
        match checked_deduct(4, 9) {
            Err(AppError::InsufficientStock { available }) => assert_eq!(available, 4),
            other => panic!("esperava InsufficientStock, veio {other:?}"),
        }
    }

    fn product(id: u128, parent_id: Option<Uuid>, units_per_parent: Option<i32>) -> Product {
        Product {
            id: Uuid::from_u128(id),
            name: "Produto".into(),
            description: None,
            sale_price: dec!(10.00),
            stock_quantity: 0,
            weighted_avg_cost: Decimal::ZERO,
            total_inventory_cost: Decimal::ZERO,
            parent_id,
            units_per_parent,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn units_per_case_comes_from_the_parent_row() {
        // Par configurado: a caixa declara o rendimento, a unidade só
        // aponta para a caixa.
        let parent = product(1, None, Some(12));
        let child = product(2, Some(Uuid::from_u128(1)), None);
        assert_eq!(units_per_case(&parent, &child).unwrap(), 12);
    }

    #[test]
    fn units_per_case_rejects_child_of_another_parent() {
        let parent = product(1, None, Some(12));
        let stranger = product(3, Some(Uuid::from_u128(99)), None);
        assert!(matches!(
            units_per_case(&parent, &stranger),
            Err(AppError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn units_per_case_rejects_parent_without_yield_configured() {
        let parent = product(1, None, None);
        let child = product(2, Some(Uuid::from_u128(1)), None);
        assert!(matches!(
            units_per_case(&parent, &child),
            Err(AppError::InvalidStateTransition(_))
        ));
    }
}
