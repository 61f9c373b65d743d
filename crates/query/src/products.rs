//! Product catalog listings.

use common::ProductId;
use domain::Product;
use store::{PageInfo, PageRequest, ProductFilter, ProductSort, ProductStore};

use crate::error::{QueryError, Result};
use crate::orders::Page;

/// Read-side queries over the product catalog.
#[derive(Debug, Clone)]
pub struct ProductQueries<S> {
    store: S,
}

impl<S: ProductStore> ProductQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .product(product_id)
            .await?
            .ok_or(QueryError::ProductNotFound(product_id))
    }

    #[tracing::instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let (items, total) = self.store.find_products(filter, sort, page).await?;
        Ok(Page {
            items,
            page_info: PageInfo::build(page, total),
        })
    }
}
