// src/services/billing_service.rs

use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, OrderRepository},
    models::{
        billing::{FiadoPayment, Installment, InstallmentPlan, InstallmentStatus},
        order::OrderStatus,
    },
};

/// Dia `day` dentro do mês, recuando para o último dia válido quando o mês
/// é mais curto (ex.: dia 31 em abril vira 30).
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let mut d = day.clamp(1, 31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, d) {
            return date;
        }
        d -= 1;
    }
}

/// Vencimentos de um carnê: o primeiro cai no mês corrente no dia
/// escolhido, rolando para o mês seguinte se o dia já passou; os demais
/// avançam um mês-calendário por parcela.
pub fn installment_due_dates(today: NaiveDate, due_day: u32, count: i32) -> Vec<NaiveDate> {
    let first = if today.day() > due_day {
        let next = today
            .checked_add_months(Months::new(1))
            .unwrap_or(today);
        clamped_date(next.year(), next.month(), due_day)
    } else {
        clamped_date(today.year(), today.month(), due_day)
    };

    (0..count.max(0) as u32)
        .map(|i| first.checked_add_months(Months::new(i)).unwrap_or(first))
        .collect()
}

/// Amortização FIFO: dívidas mais antigas primeiro, pagamento parcial
/// permitido no meio, e qualquer sobra além da dívida total simplesmente
/// não é alocada.
pub fn allocate_fifo(open_debts: &[(Uuid, Decimal)], amount: Decimal) -> Vec<(Uuid, Decimal)> {
    let mut remaining = amount;
    let mut allocations = Vec::new();

    for &(order_id, owed) in open_debts {
        if remaining <= Decimal::ZERO {
            break;
        }
        let applied = remaining.min(owed);
        if applied > Decimal::ZERO {
            allocations.push((order_id, applied));
            remaining -= applied;
        }
    }
    allocations
}

#[derive(Clone)]
pub struct BillingService {
    billing_repo: BillingRepository,
    order_repo: OrderRepository,
}

impl BillingService {
    pub fn new(billing_repo: BillingRepository, order_repo: OrderRepository) -> Self {
        Self {
            billing_repo,
            order_repo,
        }
    }

    // ---
    // Planos
    // ---

    pub async fn create_plan<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        installment_count: i32,
        installment_value: Decimal,
    ) -> Result<InstallmentPlan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.billing_repo
            .create_plan(executor, product_id, installment_count, installment_value)
            .await
    }

    pub async fn get_plans_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<InstallmentPlan>, AppError> {
        self.billing_repo.get_plans_for_product(product_id).await
    }

    pub async fn list_installments(&self, order_id: Uuid) -> Result<Vec<Installment>, AppError> {
        self.billing_repo.list_installments(order_id).await
    }

    pub async fn list_fiado_payments(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<FiadoPayment>, AppError> {
        self.billing_repo.list_fiado_payments(order_id).await
    }

    // ---
    // Geração do carnê (chamado dentro da transação do checkout)
    // ---

    /// Gera as parcelas de um pedido: valor = parcela do plano × quantidade
    /// total, todas pendentes.
    pub async fn generate_installments(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order_id: Uuid,
        plan: &InstallmentPlan,
        due_day: u32,
        total_quantity: i32,
    ) -> Result<Vec<Installment>, AppError> {
        let value = plan.installment_value * Decimal::from(total_quantity);
        let due_dates =
            installment_due_dates(Utc::now().date_naive(), due_day, plan.installment_count);

        let mut installments = Vec::with_capacity(due_dates.len());
        for (idx, due_date) in due_dates.into_iter().enumerate() {
            let installment = self
                .billing_repo
                .insert_installment(&mut **tx, order_id, (idx + 1) as i32, value, due_date)
                .await?;
            installments.push(installment);
        }
        Ok(installments)
    }

    // ---
    // Fiado
    // ---

    /// Pagamento parcial contra um único pedido fiado. Quando o acumulado
    /// atinge o total, o pedido vira Entregue.
    pub async fn record_fiado_payment<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        amount: Decimal,
    ) -> Result<FiadoPayment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .order_repo
            .get_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::NotFound("Pedido"))?;

        if order.status != OrderStatus::Fiado {
            return Err(AppError::InvalidStateTransition(
                "Apenas pedidos fiado recebem pagamentos parciais.".into(),
            ));
        }

        let already_paid = self.billing_repo.sum_fiado_payments(&mut *tx, order_id).await?;
        let owed = order.total_value - already_paid;
        if amount > owed {
            return Err(AppError::ExceedsBalance);
        }

        let payment = self
            .billing_repo
            .insert_fiado_payment(&mut *tx, order_id, amount)
            .await?;

        if already_paid + amount >= order.total_value {
            self.order_repo
                .set_status(&mut *tx, order_id, OrderStatus::Delivered, Some(Utc::now()))
                .await?;
        }

        tx.commit().await?;
        Ok(payment)
    }

    /// Quita as dívidas fiado de um cliente em ordem FIFO (pedido mais
    /// antigo primeiro). Sobra além da dívida total fica sem alocação —
    /// não é erro nem reembolso.
    pub async fn allocate_bulk_payment<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        amount: Decimal,
    ) -> Result<BulkAllocationResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let orders = self
            .order_repo
            .get_open_fiado_for_update(&mut *tx, customer_id)
            .await?;

        let mut debts = Vec::with_capacity(orders.len());
        for order in &orders {
            let paid = self.billing_repo.sum_fiado_payments(&mut *tx, order.id).await?;
            debts.push((order.id, order.total_value - paid));
        }

        let allocations = allocate_fifo(&debts, amount);
        let mut allocated_total = Decimal::ZERO;
        let mut orders_settled = 0;

        for &(order_id, applied) in &allocations {
            self.billing_repo
                .insert_fiado_payment(&mut *tx, order_id, applied)
                .await?;
            allocated_total += applied;

            let owed = debts
                .iter()
                .find(|(id, _)| *id == order_id)
                .map(|(_, owed)| *owed)
                .unwrap_or(Decimal::ZERO);
            if applied >= owed {
                self.order_repo
                    .set_status(&mut *tx, order_id, OrderStatus::Delivered, Some(Utc::now()))
                    .await?;
                orders_settled += 1;
            }
        }

        tx.commit().await?;
        Ok(BulkAllocationResult {
            allocated: allocated_total,
            unallocated: amount - allocated_total,
            orders_settled,
        })
    }

    /// Saldo devedor fiado total de um cliente.
    pub async fn fiado_balance<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let orders = self.order_repo.list_open_fiado(&mut *conn, customer_id).await?;

        let mut balance = Decimal::ZERO;
        for order in &orders {
            let paid = self.billing_repo.sum_fiado_payments(&mut *conn, order.id).await?;
            balance += order.total_value - paid;
        }
        Ok(balance)
    }

    // ---
    // Parcelas
    // ---

    /// Marca uma parcela como paga; quando era a última pendente do pedido,
    /// o pedido vira Entregue.
    pub async fn mark_installment_paid<'e, E>(
        &self,
        executor: E,
        installment_id: Uuid,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let installment = self
            .billing_repo
            .get_installment_for_update(&mut *tx, installment_id)
            .await?
            .ok_or(AppError::NotFound("Parcela"))?;

        if installment.status == InstallmentStatus::Paid {
            return Err(AppError::InstallmentAlreadyPaid);
        }

        let updated = self
            .billing_repo
            .mark_installment_paid(&mut *tx, installment_id, Utc::now())
            .await?;

        let pending = self
            .billing_repo
            .count_pending_installments(&mut *tx, installment.order_id)
            .await?;
        if pending == 0 {
            self.order_repo
                .set_status(&mut *tx, installment.order_id, OrderStatus::Delivered, Some(Utc::now()))
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAllocationResult {
    pub allocated: Decimal,
    pub unallocated: Decimal,
    pub orders_settled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn first_due_date_rolls_to_next_month_when_day_has_passed() {
        // Hoje dia 15, vencimento dia 10 => primeira parcela mês seguinte
        let dates = installment_due_dates(d(2026, 3, 15), 10, 3);
        assert_eq!(dates, vec![d(2026, 4, 10), d(2026, 5, 10), d(2026, 6, 10)]);
    }

    #[test]
    fn first_due_date_stays_in_current_month_when_day_not_passed() {
        let dates = installment_due_dates(d(2026, 3, 5), 10, 2);
        assert_eq!(dates, vec![d(2026, 3, 10), d(2026, 4, 10)]);
    }

    #[test]
    fn due_day_equal_to_today_stays_in_current_month() {
        let dates = installment_due_dates(d(2026, 3, 10), 10, 1);
        assert_eq!(dates, vec![d(2026, 3, 10)]);
    }

    #[test]
    fn short_months_clamp_the_due_day() {
        // Dia 31 com vencimentos passando por fevereiro
        let dates = installment_due_dates(d(2026, 1, 5), 31, 3);
        assert_eq!(dates[0], d(2026, 1, 31));
        assert_eq!(dates[1], d(2026, 2, 28));
        assert_eq!(dates[2], d(2026, 3, 31));
    }

    #[test]
    fn december_rollover_crosses_the_year() {
        let dates = installment_due_dates(d(2026, 12, 20), 10, 2);
        assert_eq!(dates, vec![d(2027, 1, 10), d(2027, 2, 10)]);
    }

    fn debts(v: &[(u128, &str)]) -> Vec<(Uuid, Decimal)> {
        v.iter()
            .map(|(n, owed)| (Uuid::from_u128(*n), owed.parse().unwrap()))
            .collect()
    }

    #[test]
    fn fifo_pays_oldest_first_with_partial_tail() {
        // Pedido 1: 100, Pedido 2: 50; pagamento de 120
        let allocations = allocate_fifo(&debts(&[(1, "100"), (2, "50")]), dec!(120));
        assert_eq!(
            allocations,
            vec![(Uuid::from_u128(1), dec!(100)), (Uuid::from_u128(2), dec!(20))]
        );
    }

    #[test]
    fn fifo_exact_amount_settles_everything() {
        let allocations = allocate_fifo(&debts(&[(1, "100"), (2, "50")]), dec!(150));
        assert_eq!(
            allocations,
            vec![(Uuid::from_u128(1), dec!(100)), (Uuid::from_u128(2), dec!(50))]
        );
    }

    #[test]
    fn fifo_excess_is_silently_unallocated() {
        let allocations = allocate_fifo(&debts(&[(1, "100"), (2, "50")]), dec!(200));
        let total: Decimal = allocations.iter().map(|(_, v)| *v).sum();
        assert_eq!(total, dec!(150));
    }

    #[test]
    fn fifo_stops_early_when_amount_runs_out() {
        let allocations = allocate_fifo(&debts(&[(1, "30"), (2, "30"), (3, "30")]), dec!(30));
        assert_eq!(allocations, vec![(Uuid::from_u128(1), dec!(30))]);
    }

    #[test]
    fn fifo_with_no_debts_allocates_nothing() {
        assert!(allocate_fifo(&[], dec!(99)).is_empty());
    }
}
