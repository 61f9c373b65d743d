//! Filter, sort, and pagination types shared by store implementations.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money};
use domain::{Order, OrderStatus, PaymentStatus, Product, ProductStatus};
use serde::Serialize;

const MAX_PAGE_SIZE: u64 = 100;

/// A one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Creates a page request, clamping page to >= 1 and limit to
    /// 1..=100.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Pagination envelope returned alongside listing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u64,
}

impl PageInfo {
    /// Builds pagination info from the request and the total match
    /// count.
    pub fn build(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit());
        Self {
            current_page: request.page(),
            total_pages,
            total,
            has_next_page: request.page() < total_pages,
            has_prev_page: request.page() > 1,
            limit: request.limit(),
        }
    }
}

/// Filter predicates for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive substring match over order number, customer
    /// name, customer email, and shipping phone.
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Returns true if `order` satisfies every set predicate.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        if let Some(payment_status) = self.payment_status
            && order.payment_status() != payment_status
        {
            return false;
        }
        if let Some(customer_id) = self.customer_id
            && order.customer_id() != customer_id
        {
            return false;
        }
        if let Some(from) = self.created_from
            && order.created_at() < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && order.created_at() > to
        {
            return false;
        }
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            let haystacks = [
                order.order_number(),
                order.customer().name.as_str(),
                order.customer().email.as_str(),
                order.shipping_address().phone.as_str(),
            ];
            if !haystacks
                .iter()
                .any(|h| h.to_lowercase().contains(&term))
            {
                return false;
            }
        }
        true
    }
}

/// Sort order for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    Newest,
    Oldest,
    AmountAsc,
    AmountDesc,
}

impl std::str::FromStr for OrderSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "newest" => Ok(OrderSort::Newest),
            "oldest" => Ok(OrderSort::Oldest),
            "amount_asc" => Ok(OrderSort::AmountAsc),
            "amount_desc" => Ok(OrderSort::AmountDesc),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl OrderSort {
    /// Sorts a materialized result set in place. Ties break on order
    /// number so pagination stays stable.
    pub fn apply(self, orders: &mut [Order]) {
        match self {
            OrderSort::Newest => orders.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| b.order_number().cmp(a.order_number()))
            }),
            OrderSort::Oldest => orders.sort_by(|a, b| {
                a.created_at()
                    .cmp(&b.created_at())
                    .then_with(|| a.order_number().cmp(b.order_number()))
            }),
            OrderSort::AmountAsc => orders.sort_by(|a, b| {
                a.final_amount()
                    .cmp(&b.final_amount())
                    .then_with(|| a.order_number().cmp(b.order_number()))
            }),
            OrderSort::AmountDesc => orders.sort_by(|a, b| {
                b.final_amount()
                    .cmp(&a.final_amount())
                    .then_with(|| a.order_number().cmp(b.order_number()))
            }),
        }
    }
}

/// Filter predicates for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match over name and description.
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub price_min: Option<Money>,
    pub price_max: Option<Money>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    /// Returns true if `product` satisfies every set predicate.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(status) = self.status
            && product.status != status
        {
            return false;
        }
        if let Some(min) = self.price_min
            && product.price < min
        {
            return false;
        }
        if let Some(max) = self.price_max
            && product.price > max
        {
            return false;
        }
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            if !product.name.to_lowercase().contains(&term)
                && !product.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ProductSort::Newest),
            "oldest" => Ok(ProductSort::Oldest),
            "price_asc" => Ok(ProductSort::PriceAsc),
            "price_desc" => Ok(ProductSort::PriceDesc),
            "name_asc" => Ok(ProductSort::NameAsc),
            "name_desc" => Ok(ProductSort::NameDesc),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl ProductSort {
    /// Sorts a materialized result set in place.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::Oldest => products.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::NameAsc => products.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::NameDesc => products.sort_by(|a, b| b.name.cmp(&a.name)),
        }
    }
}
