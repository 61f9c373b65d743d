//! Order document: line-item snapshots, derived amounts, status
//! history, and the guarded state machine transitions.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::product::Variant;
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// Formats a sequence number as a human-readable order number.
///
/// The sequence is issued atomically by the order store, never derived
/// from a document count.
pub fn format_order_number(seq: u64) -> String {
    format!("ORD{seq:06}")
}

/// Immutable snapshot of one purchased product at time of sale.
///
/// Later product mutations (price changes, renames, soft deletes) do
/// not affect existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub image: String,
}

impl LineItem {
    /// Returns the total price for this line (quantity * unit_price),
    /// or `None` if the product of the two overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Denormalized customer snapshot taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
}

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub ward: String,
}

/// One entry in the append-only status audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Status label; `payment_*` entries track payment changes.
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    /// Acting identity; absent for system or customer-initiated
    /// changes without an authenticated admin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// Checkout input, minus the line items (those are snapshotted from
/// live product state by the reservation coordinator).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: String,
    pub shipping_fee: Money,
    pub discount_amount: Money,
}

/// An order and its full lifecycle from checkout to delivery or
/// cancellation.
///
/// Fields are private so that status changes always go through the
/// state machine guard and always append a history entry, and so the
/// finalized amount is always derived, never set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    customer: CustomerInfo,
    items: Vec<LineItem>,
    total_amount: Money,
    shipping_fee: Money,
    discount_amount: Money,
    final_amount: Money,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_address: ShippingAddress,
    #[serde(default)]
    notes: String,
    status_history: Vec<StatusHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actual_delivery: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    /// Optimistic concurrency version; bumped on every persisted
    /// update.
    #[serde(default)]
    version: u64,
}

impl Order {
    /// Places a new pending order from validated checkout input.
    ///
    /// `order_number_seq` comes from the store's atomic sequence.
    /// Amounts are derived here: `total` is the sum of line totals and
    /// `final = total + shipping − discount`.
    pub fn place(
        order_number_seq: u64,
        input: NewOrder,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        if items.iter().any(|item| item.quantity == 0) {
            return Err(DomainError::InvalidArgument(
                "line item quantity must be at least 1".to_string(),
            ));
        }
        if input.shipping_fee.is_negative() || input.discount_amount.is_negative() {
            return Err(DomainError::InvalidArgument(
                "shipping fee and discount must not be negative".to_string(),
            ));
        }

        let overflow =
            || DomainError::InvalidArgument("order amount overflows".to_string());
        let total_amount = items
            .iter()
            .try_fold(Money::zero(), |acc, item| {
                item.line_total().and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(overflow)?;
        // Discount is non-negative, so subtracting it after a checked
        // addition cannot overflow.
        let final_amount = total_amount
            .checked_add(input.shipping_fee)
            .ok_or_else(overflow)?
            - input.discount_amount;
        if final_amount.is_negative() {
            return Err(DomainError::InvalidArgument(
                "discount exceeds order total".to_string(),
            ));
        }

        let mut order = Self {
            id: OrderId::new(),
            order_number: format_order_number(order_number_seq),
            customer_id: input.customer_id,
            customer: input.customer,
            items,
            total_amount,
            shipping_fee: input.shipping_fee,
            discount_amount: input.discount_amount,
            final_amount,
            status: OrderStatus::Pending,
            payment_method: input.payment_method,
            payment_status: PaymentStatus::Pending,
            shipping_address: input.shipping_address,
            notes: input.notes,
            status_history: Vec::new(),
            estimated_delivery: None,
            actual_delivery: None,
            created_at: now,
            version: 1,
        };
        order.push_history("pending", "Order created".to_string(), None, now);
        Ok(order)
    }

    /// Transitions the order to a new status.
    ///
    /// Enforces the state machine guard, appends exactly one history
    /// entry, and applies the delivered side effects (actual delivery
    /// timestamp, payment forced to paid under the COD assumption).
    pub fn transition_to(
        &mut self,
        to: OrderStatus,
        note: Option<String>,
        actor: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        let note = note.unwrap_or_else(|| format!("Status changed to {to}"));
        self.push_history(to.as_str(), note, actor, now);

        if to == OrderStatus::Delivered {
            self.actual_delivery = Some(now);
            // COD assumption: receiving the parcel settles payment.
            self.payment_status = PaymentStatus::Paid;
        }

        self.recompute_final_amount();
        Ok(())
    }

    /// Updates the payment status and records a `payment_*` history
    /// entry.
    pub fn set_payment_status(
        &mut self,
        payment_status: PaymentStatus,
        note: Option<String>,
        actor: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.payment_status = payment_status;
        let note =
            note.unwrap_or_else(|| format!("Payment status changed to {payment_status}"));
        self.push_history(&format!("payment_{payment_status}"), note, actor, now);
        self.recompute_final_amount();
    }

    /// Recomputes `final_amount` from its inputs. Invoked on every
    /// mutation path so a persisted order can never carry a stale or
    /// caller-supplied value.
    pub fn recompute_final_amount(&mut self) {
        self.final_amount = self.total_amount + self.shipping_fee - self.discount_amount;
    }

    /// Bumps the optimistic concurrency version. Called by stores
    /// after a successful conditional update; not part of the domain
    /// API surface.
    pub fn mark_persisted(&mut self) {
        self.version += 1;
    }

    fn push_history(
        &mut self,
        status: &str,
        note: String,
        actor: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status_history.push(StatusHistoryEntry {
            status: status.to_string(),
            timestamp: now,
            note,
            actor,
        });
    }
}

// Accessors
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn final_amount(&self) -> Money {
        self.final_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn status_history(&self) -> &[StatusHistoryEntry] {
        &self.status_history
    }

    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
