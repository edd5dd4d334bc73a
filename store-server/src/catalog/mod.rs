//! Product catalog
//!
//! The core consumes products through the [`ProductCatalog`] trait (cart
//! reads join against it, the statistics pipeline backfills display
//! names from it). [`ProductRepository`] is the store-backed
//! implementation: the `products` table holds the durable row, with a
//! short-lived cache hash (`product:cache:{id}`) in front of it.
//! Image binaries live in an external object store and are not handled
//! here.

use crate::cache::{CacheStore, keys};
use crate::db::{ColumnStore, Row, TableKind};
use crate::stock::StockLedger;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::product::{Product, ProductCreate, ProductStatus};
use shared::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;

const CF_INFO: &str = "info";

/// Product lookup collaborator
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, product_id: &str) -> AppResult<Option<Product>>;
}

#[derive(Clone)]
pub struct ProductRepository {
    cache: Arc<dyn CacheStore>,
    store: ColumnStore,
    ledger: StockLedger,
}

impl ProductRepository {
    pub fn new(cache: Arc<dyn CacheStore>, store: ColumnStore, ledger: StockLedger) -> Self {
        Self {
            cache,
            store,
            ledger,
        }
    }

    /// Create a product and seed its stock counter
    pub async fn create(&self, request: ProductCreate) -> AppResult<Product> {
        if request.id.is_empty() {
            return Err(AppError::validation("product id must not be empty"));
        }
        if request.price < Decimal::ZERO {
            return Err(AppError::validation("product price must not be negative"));
        }

        let product = Product {
            id: request.id,
            name: request.name,
            category: request.category,
            brand: request.brand,
            price: request.price,
            status: ProductStatus::Active,
            description: request.description,
        };

        self.store
            .put_row(TableKind::Products, &product.id, &Self::to_row(&product))?;
        self.ledger.set(&product.id, request.initial_stock).await?;
        self.cache_product(&product).await;

        tracing::info!(product_id = %product.id, stock = request.initial_stock, "Product created");
        Ok(product)
    }

    fn to_row(product: &Product) -> Row {
        let mut row = Row::new();
        row.put(CF_INFO, "name", &product.name);
        row.put(CF_INFO, "category", &product.category);
        row.put(CF_INFO, "brand", &product.brand);
        row.put(CF_INFO, "price", product.price.to_string());
        row.put(CF_INFO, "status", product.status.as_str());
        if let Some(description) = &product.description {
            row.put(CF_INFO, "description", description);
        }
        row
    }

    fn parse_row(product_id: &str, row: &Row) -> Option<Product> {
        let price = row.get(CF_INFO, "price")?.parse::<Decimal>().ok()?;
        Some(Product {
            id: product_id.to_string(),
            name: row.get(CF_INFO, "name").unwrap_or_default().to_string(),
            category: row.get(CF_INFO, "category").unwrap_or_default().to_string(),
            brand: row.get(CF_INFO, "brand").unwrap_or_default().to_string(),
            price,
            status: row
                .get(CF_INFO, "status")
                .and_then(ProductStatus::parse)
                .unwrap_or_default(),
            description: row.get(CF_INFO, "description").map(str::to_string),
        })
    }

    /// Best-effort write of the short-lived cache hash
    async fn cache_product(&self, product: &Product) {
        let key = keys::product_cache(&product.id);
        let fields = [
            ("name", product.name.clone()),
            ("category", product.category.clone()),
            ("brand", product.brand.clone()),
            ("price", product.price.to_string()),
            ("status", product.status.as_str().to_string()),
        ];
        for (field, value) in fields {
            if let Err(e) = self.cache.hset(&key, field, &value).await {
                tracing::warn!(product_id = %product.id, error = %e, "Failed to cache product");
                return;
            }
        }
        let _ = self
            .cache
            .expire(&key, keys::PRODUCT_CACHE_TTL_SECS)
            .await;
    }

    fn from_cached(product_id: &str, fields: &HashMap<String, String>) -> Option<Product> {
        let price = fields.get("price")?.parse::<Decimal>().ok()?;
        Some(Product {
            id: product_id.to_string(),
            name: fields.get("name").cloned().unwrap_or_default(),
            category: fields.get("category").cloned().unwrap_or_default(),
            brand: fields.get("brand").cloned().unwrap_or_default(),
            price,
            status: fields
                .get("status")
                .and_then(|s| ProductStatus::parse(s))
                .unwrap_or_default(),
            description: None,
        })
    }
}

#[async_trait]
impl ProductCatalog for ProductRepository {
    async fn get_product(&self, product_id: &str) -> AppResult<Option<Product>> {
        // Cache first; a cache failure falls through to the store
        match self.cache.hget_all(&keys::product_cache(product_id)).await {
            Ok(fields) if !fields.is_empty() => {
                if let Some(product) = Self::from_cached(product_id, &fields) {
                    return Ok(Some(product));
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Product cache read failed");
            }
        }

        let Some(row) = self.store.get_row(TableKind::Products, product_id)? else {
            return Ok(None);
        };
        let Some(product) = Self::parse_row(product_id, &row) else {
            tracing::warn!(product_id = %product_id, "Unparsable product row skipped");
            return Ok(None);
        };
        self.cache_product(&product).await;
        Ok(Some(product))
    }
}
