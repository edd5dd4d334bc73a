use crate::cache::{CacheStore, keys};
use crate::catalog::ProductCatalog;
use crate::db::{ColumnStore, Row, TableKind};
use crate::stock::StockLedger;
use rust_decimal::Decimal;
use shared::models::cart::{CartLine, CartLineView, CartSummary};
use shared::{AppError, AppResult, util};
use std::collections::HashMap;
use std::sync::Arc;

const CF_ITEMS: &str = "items";
const CF_META: &str = "meta";

fn item_column(product_id: &str) -> String {
    format!("product_{product_id}")
}

#[derive(Clone)]
pub struct CartService {
    cache: Arc<dyn CacheStore>,
    store: ColumnStore,
    catalog: Arc<dyn ProductCatalog>,
    ledger: StockLedger,
    ttl_secs: i64,
}

impl CartService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: ColumnStore,
        catalog: Arc<dyn ProductCatalog>,
        ledger: StockLedger,
        ttl_secs: i64,
    ) -> Self {
        Self {
            cache,
            store,
            catalog,
            ledger,
            ttl_secs,
        }
    }

    // ========== Mutations ==========

    /// Add a product to the cart, merging quantities for repeat adds.
    ///
    /// Stock is checked, not reserved; reservation happens at order
    /// creation.
    pub async fn add(&self, user_id: &str, product_id: &str, quantity: u32) -> AppResult<()> {
        if quantity == 0 {
            return Err(AppError::validation("quantity must be positive"));
        }
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(AppError::validation(format!(
                "product {product_id} does not exist"
            )));
        }

        let cart_key = keys::cart(user_id);
        let field = item_column(product_id);
        let existing = self.cache.hget(&cart_key, &field).await?;

        let line = match &existing {
            Some(raw) => {
                let mut line = parse_line(raw)?;
                line.quantity += quantity;
                line
            }
            None => CartLine {
                product_id: product_id.to_string(),
                quantity,
                added_at: util::now_millis(),
                selected: true,
            },
        };
        self.check_stock(product_id, line.quantity).await?;

        self.cache
            .hset(&cart_key, &field, &serde_json::to_string(&line)?)
            .await?;
        self.cache.expire(&cart_key, self.ttl_secs).await?;

        if let Err(e) = self.write_durable(user_id).await {
            // Durable write failed: put the cache back the way it was
            tracing::error!(user_id = %user_id, product_id = %product_id, error = %e,
                "Durable cart write failed, reverting cache");
            self.revert_field(&cart_key, &field, existing.as_deref()).await;
            return Err(e);
        }

        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "Cart line added");
        Ok(())
    }

    /// Set the exact quantity of an existing cart line
    pub async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> AppResult<()> {
        if quantity == 0 {
            return Err(AppError::validation("quantity must be positive"));
        }

        let cart_key = keys::cart(user_id);
        let field = item_column(product_id);
        let Some(existing) = self.cache.hget(&cart_key, &field).await? else {
            return Err(AppError::validation(format!(
                "product {product_id} is not in the cart"
            )));
        };
        self.check_stock(product_id, quantity).await?;

        let mut line = parse_line(&existing)?;
        line.quantity = quantity;
        self.cache
            .hset(&cart_key, &field, &serde_json::to_string(&line)?)
            .await?;
        self.cache.expire(&cart_key, self.ttl_secs).await?;

        if let Err(e) = self.write_durable(user_id).await {
            tracing::error!(user_id = %user_id, product_id = %product_id, error = %e,
                "Durable cart write failed, reverting cache");
            self.revert_field(&cart_key, &field, Some(&existing)).await;
            return Err(e);
        }

        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "Cart quantity updated");
        Ok(())
    }

    /// Remove the given products from the cart (absent ids are ignored)
    pub async fn remove(&self, user_id: &str, product_ids: &[String]) -> AppResult<()> {
        if product_ids.is_empty() {
            return Err(AppError::validation("product id list must not be empty"));
        }

        let cart_key = keys::cart(user_id);
        let snapshot = self.snapshot_fields(&cart_key, product_ids).await?;

        let fields: Vec<String> = product_ids.iter().map(|id| item_column(id)).collect();
        let field_refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        self.cache.hdel(&cart_key, &field_refs).await?;

        if let Err(e) = self.write_durable(user_id).await {
            tracing::error!(user_id = %user_id, error = %e,
                "Durable cart write failed, reverting cache");
            self.restore_snapshot(&cart_key, &snapshot).await;
            return Err(e);
        }

        tracing::info!(user_id = %user_id, count = product_ids.len(), "Cart lines removed");
        Ok(())
    }

    /// Destroy the cart in both stores
    pub async fn clear(&self, user_id: &str) -> AppResult<()> {
        let cart_key = keys::cart(user_id);
        let snapshot = self.cache.hget_all(&cart_key).await?;

        self.cache.del(&cart_key).await?;

        if let Err(e) = self
            .store
            .delete_row(TableKind::Carts, user_id)
            .map_err(AppError::from)
        {
            tracing::error!(user_id = %user_id, error = %e,
                "Durable cart delete failed, reverting cache");
            self.restore_snapshot(&cart_key, &snapshot).await;
            return Err(e);
        }

        tracing::info!(user_id = %user_id, "Cart cleared");
        Ok(())
    }

    /// Flip the selected flag on the given cart lines
    pub async fn set_selected(
        &self,
        user_id: &str,
        product_ids: &[String],
        selected: bool,
    ) -> AppResult<()> {
        if product_ids.is_empty() {
            return Err(AppError::validation("product id list must not be empty"));
        }

        let cart_key = keys::cart(user_id);
        let snapshot = self.snapshot_fields(&cart_key, product_ids).await?;
        for product_id in product_ids {
            if !snapshot.contains_key(&item_column(product_id)) {
                return Err(AppError::validation(format!(
                    "product {product_id} is not in the cart"
                )));
            }
        }

        for product_id in product_ids {
            let field = item_column(product_id);
            let Some(raw) = snapshot.get(&field) else {
                continue;
            };
            let mut line = parse_line(raw)?;
            line.selected = selected;
            self.cache
                .hset(&cart_key, &field, &serde_json::to_string(&line)?)
                .await?;
        }
        self.cache.expire(&cart_key, self.ttl_secs).await?;

        if let Err(e) = self.write_durable(user_id).await {
            tracing::error!(user_id = %user_id, error = %e,
                "Durable cart write failed, reverting cache");
            self.restore_snapshot(&cart_key, &snapshot).await;
            return Err(e);
        }

        tracing::info!(user_id = %user_id, count = product_ids.len(), selected, "Cart selection updated");
        Ok(())
    }

    // ========== Reads ==========

    /// Full cart view. Cache-first; a miss falls back to the durable row
    /// and repopulates the cache (read-through fill).
    pub async fn get(&self, user_id: &str) -> AppResult<CartSummary> {
        let cart_key = keys::cart(user_id);
        let cached = self.cache.hget_all(&cart_key).await?;
        if !cached.is_empty() {
            let lines = parse_lines(&cached);
            return self.build_summary(user_id, lines).await;
        }

        let lines = self.load_durable(user_id)?;
        if lines.is_empty() {
            return Ok(CartSummary::empty(user_id));
        }

        tracing::info!(user_id = %user_id, count = lines.len(), "Cart loaded from durable store");
        for line in &lines {
            self.cache
                .hset(
                    &cart_key,
                    &item_column(&line.product_id),
                    &serde_json::to_string(line)?,
                )
                .await?;
        }
        self.cache.expire(&cart_key, self.ttl_secs).await?;

        self.build_summary(user_id, lines).await
    }

    // ========== Internals ==========

    async fn check_stock(&self, product_id: &str, requested: u32) -> AppResult<()> {
        let available = self.ledger.peek(product_id).await?.unwrap_or(0);
        if available < requested as u64 {
            return Err(AppError::InsufficientStock {
                product_id: product_id.to_string(),
                requested,
                available: available.min(u32::MAX as u64) as u32,
            });
        }
        Ok(())
    }

    /// Serialize the whole current cache copy into the durable row
    async fn write_durable(&self, user_id: &str) -> AppResult<()> {
        let cached = self.cache.hget_all(&keys::cart(user_id)).await?;
        let lines = parse_lines(&cached);

        if lines.is_empty() {
            self.store.delete_row(TableKind::Carts, user_id)?;
            return Ok(());
        }

        let mut row = Row::new();
        for line in &lines {
            row.put(
                CF_ITEMS,
                &item_column(&line.product_id),
                serde_json::to_string(line)?,
            );
        }
        row.put(CF_META, "update_time", util::now_millis().to_string());
        row.put(CF_META, "total_items", lines.len().to_string());
        row.put(CF_META, "status", "ACTIVE");

        self.store.put_row(TableKind::Carts, user_id, &row)?;
        Ok(())
    }

    fn load_durable(&self, user_id: &str) -> AppResult<Vec<CartLine>> {
        let Some(row) = self.store.get_row(TableKind::Carts, user_id)? else {
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        for (qualifier, raw) in row.family(CF_ITEMS) {
            match serde_json::from_str::<CartLine>(raw) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    tracing::error!(user_id = %user_id, qualifier = %qualifier, error = %e,
                        "Unparsable durable cart line skipped");
                }
            }
        }
        Ok(lines)
    }

    async fn build_summary(&self, user_id: &str, mut lines: Vec<CartLine>) -> AppResult<CartSummary> {
        lines.sort_by_key(|line| line.added_at);

        let mut views = Vec::with_capacity(lines.len());
        let mut total_quantity = 0u32;
        let mut total_amount = Decimal::ZERO;

        for line in lines {
            let Some(product) = self.catalog.get_product(&line.product_id).await? else {
                tracing::warn!(product_id = %line.product_id, "Cart references unknown product, skipping");
                continue;
            };
            total_quantity += line.quantity;
            total_amount += product.price * Decimal::from(line.quantity);
            views.push(CartLineView {
                product_id: line.product_id,
                product_name: product.name,
                category: product.category,
                brand: product.brand,
                unit_price: product.price,
                quantity: line.quantity,
                added_at: line.added_at,
                selected: line.selected,
            });
        }

        Ok(CartSummary {
            user_id: user_id.to_string(),
            lines: views,
            total_quantity,
            total_amount,
        })
    }

    async fn snapshot_fields(
        &self,
        cart_key: &str,
        product_ids: &[String],
    ) -> AppResult<HashMap<String, String>> {
        let mut snapshot = HashMap::new();
        for product_id in product_ids {
            let field = item_column(product_id);
            if let Some(raw) = self.cache.hget(cart_key, &field).await? {
                snapshot.insert(field, raw);
            }
        }
        Ok(snapshot)
    }

    /// Best-effort cache revert after a failed durable write
    async fn revert_field(&self, cart_key: &str, field: &str, previous: Option<&str>) {
        let result = match previous {
            Some(raw) => self.cache.hset(cart_key, field, raw).await,
            None => self.cache.hdel(cart_key, &[field]).await,
        };
        if let Err(e) = result {
            tracing::error!(field = %field, error = %e, "Cache revert failed");
        }
    }

    async fn restore_snapshot(&self, cart_key: &str, snapshot: &HashMap<String, String>) {
        for (field, raw) in snapshot {
            if let Err(e) = self.cache.hset(cart_key, field, raw).await {
                tracing::error!(field = %field, error = %e, "Cache revert failed");
            }
        }
        if !snapshot.is_empty() {
            let _ = self.cache.expire(cart_key, self.ttl_secs).await;
        }
    }
}

fn parse_line(raw: &str) -> AppResult<CartLine> {
    serde_json::from_str(raw).map_err(AppError::from)
}

fn parse_lines(fields: &HashMap<String, String>) -> Vec<CartLine> {
    let mut lines = Vec::with_capacity(fields.len());
    for (field, raw) in fields {
        match serde_json::from_str::<CartLine>(raw) {
            Ok(line) => lines.push(line),
            Err(e) => {
                tracing::error!(field = %field, error = %e, "Unparsable cart line skipped");
            }
        }
    }
    lines
}
