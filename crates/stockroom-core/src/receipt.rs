//! # Receipt Rendering
//!
//! Turns a completed order and its bill into an ESC/POS byte stream for a
//! thermal printer. Sending the bytes to a device is the caller's job.
//!
//! ## Layout (48 columns)
//! ```text
//!                 STOCKROOM
//! ================================================
//! Order: 3f2a…                   2024-03-01 09:14
//! Customer: Ada Lovelace
//! ------------------------------------------------
//! Widget                                     $3.00
//!   3 x $1.00
//! ------------------------------------------------
//! Subtotal                                   $3.00
//! Tax (8.25%)                                $0.25
//! TOTAL                                      $3.25
//! Paid: cash
//! ```

use crate::types::{Bill, Order, StoreSettings};

// =============================================================================
// ESC/POS Builder
// =============================================================================

/// Fluent ESC/POS command builder.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// New builder for `width` characters per line. Emits `ESC @` (init).
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(1024);
        buf.extend_from_slice(&[0x1B, 0x40]);
        EscPosBuilder { buf, width }
    }

    pub fn text(&mut self, s: &str) -> &mut Self {
        // Printers without a UTF-8 code page print garbage for multibyte input.
        // Control bytes would be read as printer commands.
        for ch in s.chars() {
            if ch.is_ascii_control() {
                self.buf.push(b' ');
            } else if ch.is_ascii() {
                self.buf.push(ch as u8);
            } else {
                self.buf.push(b'?');
            }
        }
        self
    }

    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// ESC d n: print and feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, on as u8]);
        self
    }

    /// GS ! n: double width and height when `on`.
    pub fn double_size(&mut self, on: bool) -> &mut Self {
        let n = if on { 0x11 } else { 0x00 };
        self.buf.extend_from_slice(&[0x1D, 0x21, n]);
        self
    }

    pub fn separator(&mut self, ch: char) -> &mut Self {
        let rule: String = std::iter::repeat(ch).take(self.width).collect();
        self.line(&rule)
    }

    /// Left text flush left, right text flush right.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = left.chars().count();
        let rw = right.chars().count();

        if lw + rw >= self.width {
            // Too wide: right column moves to its own line.
            self.line(left);
            let pad = self.width.saturating_sub(rw);
            self.text(&" ".repeat(pad));
            self.line(right)
        } else {
            self.text(left);
            self.text(&" ".repeat(self.width - lw - rw));
            self.line(right)
        }
    }

    /// GS V 66 n: feed n lines then full cut.
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Renders the receipt for `order` and its `bill`.
pub fn render_receipt(settings: &StoreSettings, order: &Order, bill: &Bill) -> Vec<u8> {
    let width = settings.receipt_width.clamp(24, 64) as usize;
    let money = |cents: i64| settings.format_money(crate::Money::from_cents(cents));

    let mut p = EscPosBuilder::new(width);

    p.center().bold(true).double_size(true);
    p.line(&settings.store_name);
    p.double_size(false).bold(false).left();
    p.separator('=');

    let short_id: String = order.id.chars().take(8).collect();
    p.line_lr(
        &format!("Order: {}", short_id),
        &bill.created_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    p.line(&format!("Customer: {}", order.customer_name));
    p.separator('-');

    for item in &order.items {
        p.line_lr(&item.name_snapshot, &money(item.line_total().cents()));
        p.line(&format!("  {} x {}", item.quantity, money(item.unit_price_cents)));
    }

    p.separator('-');
    p.line_lr("Subtotal", &money(bill.total_cents));
    p.line_lr(&format!("Tax ({})", bill.tax_rate()), &money(bill.tax_cents));
    p.bold(true);
    p.line_lr("TOTAL", &money(bill.grand_total().cents()));
    p.bold(false);

    let paid = if bill.is_paid { "Paid" } else { "Due" };
    p.line(&format!("{}: {}", paid, bill.payment_method));

    p.center();
    p.line("Thank you!");
    p.cut_feed(4);

    p.build()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderItem, OrderStatus};
    use chrono::Utc;

    fn fixture() -> (StoreSettings, Order, Bill) {
        let now = Utc::now();
        let settings = StoreSettings {
            store_name: "Corner Shop".into(),
            tax_rate_bps: 825,
            currency_symbol: "$".into(),
            receipt_width: 32,
        };
        let order = Order {
            id: "3f2a9c1e-0000-4000-8000-000000000000".into(),
            customer_name: "Ada".into(),
            status: OrderStatus::Completed,
            items: vec![OrderItem {
                id: "l1".into(),
                order_id: "o".into(),
                item_id: "i".into(),
                name_snapshot: "Widget".into(),
                quantity: 3,
                unit_price_cents: 100,
                position: 0,
            }],
            bill: None,
            created_at: now,
            updated_at: now,
        };
        let bill = Bill {
            id: "b".into(),
            order_id: order.id.clone(),
            total_cents: 300,
            tax_cents: 25,
            tax_rate_bps: 825,
            payment_method: "cash".into(),
            is_paid: true,
            created_at: now,
        };
        (settings, order, bill)
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_receipt_framing() {
        let (settings, order, bill) = fixture();
        let bytes = render_receipt(&settings, &order, &bill);

        assert_eq!(&bytes[..2], &[0x1B, 0x40]);
        assert_eq!(&bytes[bytes.len() - 4..], &[0x1D, 0x56, 0x42, 4]);
    }

    #[test]
    fn test_receipt_contents() {
        let (settings, order, bill) = fixture();
        let bytes = render_receipt(&settings, &order, &bill);

        assert!(contains(&bytes, "Corner Shop"));
        assert!(contains(&bytes, "Order: 3f2a9c1e"));
        assert!(contains(&bytes, "  3 x $1.00"));
        assert!(contains(&bytes, "Tax (8.25%)"));
        assert!(contains(&bytes, "$3.25"));
        assert!(contains(&bytes, "Paid: cash"));
    }

    #[test]
    fn test_line_lr_pads_to_width() {
        let mut p = EscPosBuilder::new(20);
        p.line_lr("Subtotal", "$3.00");
        let bytes = p.build();
        let body = &bytes[2..];
        assert_eq!(body, b"Subtotal       $3.00\n");
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        let mut p = EscPosBuilder::new(32);
        p.text("Café");
        assert_eq!(&p.build()[2..], b"Caf?");
    }

    #[test]
    fn test_control_bytes_are_blanked() {
        let mut p = EscPosBuilder::new(32);
        p.text("Ana\x1B@\x1DV\x00\n");
        assert_eq!(&p.build()[2..], b"Ana @ V  ");
    }

    #[test]
    fn test_names_cannot_inject_printer_commands() {
        let (settings, mut order, bill) = fixture();
        order.customer_name = "Ana\x1Bp\x00\x19".into();
        order.items[0].name_snapshot = "Widget\x1DVA".into();
        let bytes = render_receipt(&settings, &order, &bill);

        assert!(contains(&bytes, "Ana p"));
        assert!(contains(&bytes, "Widget VA"));
        // Cash-drawer kick (ESC p) and cut (GS V) only come from the builder.
        assert!(!bytes.windows(2).any(|w| w == [0x1B, b'p']));
        assert_eq!(bytes.windows(2).filter(|w| *w == [0x1D, b'V']).count(), 1);
    }
}
