//! End-of-day sales report, downloaded from the kitchen dashboard as text.

use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::orders::{
    model::{Order, OrderStatus},
    token::day_key,
};

const TIME_OF_DAY: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const GENERATED_AT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("No sales data available for today yet.")]
    NoSales,
    #[error("could not format report: {0}")]
    Format(String),
}

impl From<time::error::Format> for ReportError {
    fn from(e: time::error::Format) -> Self {
        ReportError::Format(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesReport {
    pub filename: String,
    pub body: String,
}

/// Items as one cell: `"2x Chicken Rice, 1x Coca Cola"`.
fn items_cell(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|l| format!("{}x {}", l.quantity, l.item.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Today's non-cancelled orders, oldest first, numbered `1..=N` by row.
pub fn build_report(orders: &[Order], today: Date, generated_at: OffsetDateTime) -> Result<SalesReport, ReportError> {
    let mut sales: Vec<&Order> = orders
        .iter()
        .filter(|o| day_key(o.created_at) == today && o.status != OrderStatus::Cancelled)
        .collect();
    if sales.is_empty() {
        return Err(ReportError::NoSales);
    }
    sales.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let revenue: i64 = sales.iter().map(|o| o.total_amount).sum();
    let date = today.format(DATE)?;

    let mut body = String::new();
    body.push_str("Hotel Anandam\n");
    body.push_str("Daily Sales Report\n");
    body.push_str(&format!("Date: {date}\n\n"));
    body.push_str(&format!("Total Orders: {}    Total Revenue: Rs. {revenue}\n\n", sales.len()));
    body.push_str(&format!(
        "{:<5} | {:<6} | {:<5} | {:<15} | {} | {} | {}\n",
        "Token", "ID", "Time", "Customer Number", "Items", "Amount", "Status"
    ));
    for (idx, order) in sales.iter().enumerate() {
        let token = idx + 1;
        let id = order.id.to_string();
        body.push_str(&format!(
            "{:<5} | {:<6} | {:<5} | {:<15} | {} | Rs. {} | {}\n",
            token,
            &id[..6],
            order.created_at.format(TIME_OF_DAY)?,
            order.phone,
            items_cell(order),
            order.total_amount,
            order.status,
        ));
    }
    body.push_str(&format!("\nReport generated at {}\n", generated_at.format(GENERATED_AT)?));

    Ok(SalesReport { filename: format!("HotelAnandam_Sales_{date}.txt"), body })
}
