//! # Invoice Projection
//!
//! An invoice is a derived, one-to-one projection of a sale. It is
//! produced by a single one-way function so the two records can never
//! drift: regenerating the invoice from its sale always yields the
//! same figures.
//!
//! ```text
//! Sale ──invoice_from_sale()──► Invoice
//!   subtotal  ────────────────►  base_imponible
//!   iva       ────────────────►  iva
//!   total     ────────────────►  total
//!   items     ────────────────►  lines (mirrored)
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Invoice, InvoiceLine, Sale};
use crate::FINAL_CONSUMER_NAME;

/// Projects a sale into its invoice.
///
/// ## Arguments
/// * `sale` - The settled sale to project
/// * `invoice_number` - Business number (generated by the engine)
/// * `customer_identification` - Fiscal id of the linked customer,
///   when one exists
/// * `issued_at` - Issue timestamp
///
/// ## Addressee
/// The invoice addressee is the sale's customer name; anonymous
/// walk-ins get the final-consumer placeholder.
pub fn invoice_from_sale(
    sale: &Sale,
    invoice_number: &str,
    customer_identification: Option<String>,
    issued_at: DateTime<Utc>,
) -> Invoice {
    let lines = sale
        .items
        .iter()
        .map(|item| InvoiceLine {
            description: item.name_snapshot.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            iva_bps: item.iva_bps,
            subtotal_cents: item.subtotal_cents,
            iva_cents: item.iva_cents,
        })
        .collect();

    Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number: invoice_number.to_string(),
        sale_id: sale.id.clone(),
        base_imponible_cents: sale.subtotal_cents,
        iva_cents: sale.iva_cents,
        total_cents: sale.total_cents,
        lines,
        customer_name: sale
            .customer_name
            .clone()
            .unwrap_or_else(|| FINAL_CONSUMER_NAME.to_string()),
        customer_identification,
        issued_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, PaymentMethod, SaleItem, SaleStatus};

    fn sample_sale() -> Sale {
        Sale {
            id: "s1".to_string(),
            sale_number: "V-260831-120000-0042".to_string(),
            channel: Channel::Physical,
            store_id: Some("t1".to_string()),
            customer_id: None,
            customer_name: None,
            items: vec![SaleItem {
                product_id: "p1".to_string(),
                variant_index: None,
                name_snapshot: "Producto p1".to_string(),
                unit_price_cents: 10000,
                iva_bps: 2100,
                quantity: 1,
                subtotal_cents: 10000,
                net_cents: 10000,
                iva_cents: 2100,
            }],
            subtotal_cents: 10000,
            discount_bps: 0,
            discount_cents: 0,
            iva_cents: 2100,
            total_cents: 12100,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_projection_mirrors_totals_and_lines() {
        let sale = sample_sale();
        let invoice = invoice_from_sale(&sale, "F-260831-120000-0042", None, Utc::now());

        assert_eq!(invoice.sale_id, "s1");
        assert_eq!(invoice.base_imponible_cents, sale.subtotal_cents);
        assert_eq!(invoice.iva_cents, sale.iva_cents);
        assert_eq!(invoice.total_cents, sale.total_cents);
        assert_eq!(invoice.lines.len(), 1);
        assert_eq!(invoice.lines[0].description, "Producto p1");
        assert_eq!(invoice.lines[0].iva_cents, 2100);
    }

    #[test]
    fn test_anonymous_sale_gets_final_consumer() {
        let sale = sample_sale();
        let invoice = invoice_from_sale(&sale, "F-1", None, Utc::now());
        assert_eq!(invoice.customer_name, FINAL_CONSUMER_NAME);
    }

    #[test]
    fn test_named_customer_carries_over() {
        let mut sale = sample_sale();
        sale.customer_name = Some("Ana García".to_string());

        let invoice = invoice_from_sale(&sale, "F-1", Some("12345678Z".to_string()), Utc::now());

        assert_eq!(invoice.customer_name, "Ana García");
        assert_eq!(invoice.customer_identification.as_deref(), Some("12345678Z"));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let sale = sample_sale();
        let at = Utc::now();
        let a = invoice_from_sale(&sale, "F-1", None, at);
        let b = invoice_from_sale(&sale, "F-1", None, at);

        // Same figures every time (ids aside, which are fresh)
        assert_eq!(a.base_imponible_cents, b.base_imponible_cents);
        assert_eq!(a.total_cents, b.total_cents);
        assert_eq!(a.lines.len(), b.lines.len());
    }
}
