//! Order notifications for the shop owner.
//!
//! Every new order (online checkout or manual) produces one business message.
//! The default notifier only logs it; implement [`OrderNotifier`] to deliver
//! through a messaging gateway instead. Delivery failures are logged by the
//! caller and never fail the order.

use anyhow::Result;
use tracing::info;

use crate::store::Order;

/// Recipient label used by the log notifier.
pub const BUSINESS_RECIPIENT: &str = "PuraBombilla business number";

pub trait OrderNotifier: Send + Sync {
    /// Deliver the notification for a freshly stored order.
    fn notify(&self, order: &Order) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn notify(&self, order: &Order) -> Result<()> {
        info!(
            order_id = %order.id,
            to = BUSINESS_RECIPIENT,
            message = %format_order_message(order),
            "order notification stub"
        );
        Ok(())
    }
}

/// Render the business message for an order.
#[must_use]
pub fn format_order_message(order: &Order) -> String {
    let items = order
        .items
        .iter()
        .map(|item| format!("- {}x {}", item.quantity, item.product_name))
        .collect::<Vec<_>>()
        .join("\n");
    let origin = if order.is_manual {
        "Manual"
    } else {
        "Tienda Online"
    };

    format!(
        "📦 ¡Nuevo pedido en PuraBombilla! 📦\n\
         *N° de Pedido:* {id}\n\
         *Fecha:* {date}\n\
         *Cliente:*\n\
         - *Nombre:* {name}\n\
         - *WhatsApp:* {whatsapp}\n\
         *Detalle:*\n\
         {items}\n\
         *Total:* ${total}\n\
         *Dirección/Notas:*\n\
         {address}\n\
         *Origen:* {origin}",
        id = order.id,
        date = order.created_at.format("%d/%m/%Y %H:%M:%S"),
        name = order.customer_name,
        whatsapp = order.customer_whatsapp,
        total = group_thousands(order.total),
        address = order.customer_address,
    )
}

/// `11700` -> `11.700`
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}
