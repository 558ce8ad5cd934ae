//! Printable bill for one order.

use time::{format_description::FormatItem, macros::format_description};

use crate::orders::model::{Order, DELIVERY_FEE};

const PRINTED_DATE: &[FormatItem<'static>] =
    format_description!("[day]/[month]/[year], [hour]:[minute]:[second]");

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_receipt(order: &Order, token: Option<u32>) -> String {
    let token = token.map_or_else(|| "N/A".to_string(), |t| t.to_string());
    let id = order.id.to_string();
    let date = order.created_at.format(PRINTED_DATE).unwrap_or_else(|_| order.created_at.to_string());

    let mut lines = String::new();
    for line in &order.items {
        lines.push_str(&format!(
            "<div class=\"line\"><span>{} x {}</span><span>&#8377;{}</span></div>\n",
            line.quantity,
            esc(&line.item.name),
            line.line_total()
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>Receipt - Hotel Anandam</title>
<style>
body {{ font-family: 'Courier New', Courier, monospace; padding: 20px; color: #000; }}
.header {{ text-align: center; border-bottom: 1px dashed #000; padding-bottom: 10px; margin-bottom: 15px; }}
.footer {{ border-top: 1px dashed #000; padding-top: 10px; margin-top: 15px; text-align: center; font-size: 12px; }}
.line {{ display: flex; justify-content: space-between; margin-bottom: 5px; }}
.total {{ font-weight: bold; font-size: 18px; margin-top: 10px; display: flex; justify-content: space-between; }}
.info {{ font-size: 12px; margin-bottom: 15px; line-height: 1.6; }}
.bold-line {{ font-weight: 900; font-size: 14px; }}
.token-box {{ font-size: 32px; font-weight: 900; margin: 10px 0; border: 3px solid #000; display: inline-block; padding: 10px 25px; }}
</style>
</head>
<body onload="window.print(); window.close();">
<div class="header">
<h2 style="margin:0;">HOTEL ANANDAM</h2>
<p style="margin:5px 0; font-size:12px;">Samayapuram, Madurai</p>
<div class="token-box">TOKEN: {token}</div>
<p style="margin:5px 0 0 0; font-size:11px; font-weight:bold;">TAX INVOICE</p>
</div>
<div class="info">
<div>Order ID: #{id_prefix}</div>
<div>Date: {date}</div>
<div class="bold-line">Customer Number: {phone}</div>
<div class="bold-line">Location: {location}</div>
</div>
{lines}<div class="line" style="font-size:12px; margin-top:10px;"><span>Delivery Fee</span><span>&#8377;{fee}</span></div>
<div class="total"><span>TOTAL</span><span>&#8377;{total}</span></div>
<div class="footer">
<p>Thank you for choosing Hotel Anandam!</p>
<p>Payment Mode: {payment}</p>
</div>
</body>
</html>"#,
        id_prefix = &id[..8],
        phone = esc(&order.phone),
        location = order.location,
        fee = DELIVERY_FEE,
        total = order.total_amount,
        payment = order.payment_method,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cart::model::CartLine, menu::model::default_items, orders::token::tests::order_at};
    use time::macros::datetime;

    #[test]
    fn receipt_carries_token_lines_and_totals() {
        let mut order = order_at(datetime!(2025-03-10 09:05:00 UTC));
        let mut dish = default_items().remove(0);
        dish.name = "Rice & <Curry>".into();
        order.items = vec![CartLine { item: dish, quantity: 2 }];
        order.total_amount = 390;

        let html = render_receipt(&order, Some(4));
        assert!(html.contains("TOKEN: 4"));
        assert!(html.contains(&format!("Order ID: #{}", &order.id.to_string()[..8])));
        assert!(html.contains("2 x Rice &amp; &lt;Curry&gt;"));
        assert!(html.contains("&#8377;360"));
        assert!(html.contains("Location: S-block"));
        assert!(html.contains("<span>TOTAL</span><span>&#8377;390</span>"));
        assert!(html.contains("Payment Mode: COD"));
        assert!(html.contains("Date: 10/03/2025, 09:05:00"));
        assert!(html.contains(r#"onload="window.print(); window.close();""#));
    }

    #[test]
    fn unknown_token_prints_na() {
        assert!(render_receipt(&order_at(datetime!(2025-03-10 09:05 UTC)), None).contains("TOKEN: N/A"));
    }
}
