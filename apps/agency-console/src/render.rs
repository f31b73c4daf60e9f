//! Text and JSON output for the console commands.

use agency_sync::contract::model::{
    ActivityItem, Client, Credential, DashboardMetrics, FinancialStats, Transaction,
};
use agency_sync::domain::format::{format_currency, format_date};
use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn dashboard(
    metrics: &DashboardMetrics,
    stats: &FinancialStats,
    activity: &[ActivityItem],
    json: bool,
) -> Result<()> {
    if json {
        return print_json(&json!({
            "metrics": metrics,
            "financial": stats,
            "activity": activity,
        }));
    }
    println!(
        "Clients         {} ({} active)",
        metrics.total_clients, metrics.active_clients
    );
    println!("MRR             {}", format_currency(metrics.mrr));
    println!("Pending         {}", format_currency(metrics.pending_payments));
    println!("Income          {}", format_currency(stats.income));
    println!("Expense         {}", format_currency(stats.expense));
    println!("Balance         {}", format_currency(stats.balance));
    println!();
    if activity.is_empty() {
        println!("No recent activity");
    }
    for item in activity {
        println!(
            "{}  {}",
            item.timestamp.format("%d/%m/%Y %H:%M"),
            item.description
        );
    }
    Ok(())
}

pub fn clients(clients: &[Client], json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::to_value(clients)?);
    }
    if clients.is_empty() {
        println!("No clients found");
    }
    for c in clients {
        let due = c.due_date.to_string();
        println!(
            "{}  {:<24} {:<20} {:<9} {:<12} {:>16}  due {}",
            c.id,
            c.name,
            c.slug,
            c.status,
            c.plan,
            format_currency(c.monthly_value),
            format_date(Some(&due)),
        );
    }
    Ok(())
}

pub fn transactions(txs: &[Transaction], json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::to_value(txs)?);
    }
    if txs.is_empty() {
        println!("No transactions found");
    }
    for t in txs {
        let due = t.due_date.to_string();
        let paid = t.paid_at.map(|p| p.to_rfc3339());
        let amount = match t.kind {
            agency_sync::contract::model::TransactionType::Income => format_currency(t.amount),
            agency_sync::contract::model::TransactionType::Expense => {
                format_currency(-t.amount)
            }
        };
        println!(
            "{}  {:<32} {:<20} {:<8} {:>16}  due {}  paid {}",
            t.id,
            t.description,
            t.client_name.as_deref().unwrap_or("-"),
            t.status,
            amount,
            format_date(Some(&due)),
            format_date(paid.as_deref()),
        );
    }
    Ok(())
}

pub fn stats(stats: &FinancialStats, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::to_value(stats)?);
    }
    println!("Income   {}", format_currency(stats.income));
    println!("Expense  {}", format_currency(stats.expense));
    println!("Balance  {}", format_currency(stats.balance));
    Ok(())
}

/// Passwords are masked unless `reveal` is set, in both output modes.
pub fn credentials(creds: &[Credential], reveal: bool, json: bool) -> Result<()> {
    let password = |c: &Credential| {
        if reveal {
            c.password.expose().to_string()
        } else {
            c.password.masked().to_string()
        }
    };

    if json {
        let rows = creds
            .iter()
            .map(|c| {
                let mut row = serde_json::to_value(c)?;
                row["password"] = Value::String(password(c));
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        return print_json(&Value::Array(rows));
    }
    if creds.is_empty() {
        println!("No credentials found");
    }
    for c in creds {
        println!(
            "{}  {:<24} {:<20} {:<28} {:<10} {}",
            c.id,
            c.title,
            c.client_name.as_deref().unwrap_or("-"),
            c.username,
            password(c),
            c.url.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

pub fn deleted(what: &str, id: Uuid, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({ "deleted": what, "id": id }));
    }
    println!("Deleted {what} {id}");
    Ok(())
}
