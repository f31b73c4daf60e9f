use rust_decimal::Decimal;

use crate::contract::model::{
    Client, ClientStatus, DashboardMetrics, FinancialStats, Transaction, TransactionStatus,
    TransactionType,
};

impl FinancialStats {
    /// Sum amounts by type regardless of status.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let (income, expense) = transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), tx| match tx.kind {
                TransactionType::Income => (income + tx.amount, expense),
                TransactionType::Expense => (income, expense + tx.amount),
            },
        );
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

impl DashboardMetrics {
    pub fn compute(clients: &[Client], transactions: &[Transaction]) -> Self {
        let active: Vec<&Client> = clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .collect();
        let pending_payments = transactions
            .iter()
            .filter(|tx| tx.kind == TransactionType::Income)
            .filter(|tx| {
                matches!(
                    tx.status,
                    TransactionStatus::Pending | TransactionStatus::Overdue
                )
            })
            .map(|tx| tx.amount)
            .sum();
        Self {
            total_clients: clients.len(),
            active_clients: active.len(),
            mrr: active.iter().map(|c| c.monthly_value).sum(),
            pending_payments,
        }
    }
}
