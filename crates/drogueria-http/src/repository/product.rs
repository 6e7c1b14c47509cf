//! # Product Repository
//!
//! Product lookups made while building a cart.
//!
//! ```text
//! scan "7702…" ──► fue-eliminado/{code} ──► true  ──► add blocked
//!                         │
//!                         └──► false ──► obtener-formas-venta/{code} ──► UnitCatalog
//! ```

use tracing::debug;

use drogueria_core::{ProductSummary, UnitOfSale};

use crate::client::ApiClient;
use crate::error::HttpResult;
use crate::normalize::{WireProduct, WireUnitOfSale};

#[derive(Debug, Clone)]
pub struct ProductRepository {
    api: ApiClient,
}

impl ProductRepository {
    pub fn new(api: ApiClient) -> Self {
        ProductRepository { api }
    }

    /// Units of sale of a product, in backend order.
    pub async fn units_of_sale(&self, code: &str) -> HttpResult<Vec<UnitOfSale>> {
        debug!(code = %code, "Fetching units of sale");

        let rows: Vec<WireUnitOfSale> = self
            .api
            .get_json(&["productos", "obtener-formas-venta", code], &[])
            .await?;

        let units: Vec<UnitOfSale> = rows.into_iter().map(UnitOfSale::from).collect();
        debug!(code = %code, count = units.len(), "Units of sale fetched");
        Ok(units)
    }

    /// True if the product was deactivated.
    pub async fn is_removed(&self, code: &str) -> HttpResult<bool> {
        debug!(code = %code, "Checking removed flag");
        self.api
            .get_json(&["productos", "fue-eliminado", code], &[])
            .await
    }

    /// Every product, without units of sale.
    pub async fn list(&self) -> HttpResult<Vec<ProductSummary>> {
        let rows: Vec<WireProduct> = self.api.get_json(&["productos", "todos"], &[]).await?;
        debug!(count = rows.len(), "Product list fetched");
        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }
}
