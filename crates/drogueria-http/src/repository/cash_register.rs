//! # Cash Register Repository
//!
//! Both registers expose the same endpoints under their own prefix.
//!
//! ```text
//! CashRegisterKind::Major ──► /caja-mayor/{saldo, cerrar, historial, estado}
//! CashRegisterKind::Minor ──► /caja-menor/{saldo, cerrar, historial, estado}
//! ```

use reqwest::Method;
use tracing::{debug, info};

use drogueria_core::{CashRegisterKind, CashRegisterStatus, ClosingRecord, Money, Page};

use crate::client::ApiClient;
use crate::error::HttpResult;
use crate::normalize::{money_from_wire, WireClosing, WirePage, WireStatus};

#[derive(Debug, Clone)]
pub struct CashRegisterRepository {
    api: ApiClient,
}

impl CashRegisterRepository {
    pub fn new(api: ApiClient) -> Self {
        CashRegisterRepository { api }
    }

    pub async fn balance(&self, kind: CashRegisterKind) -> HttpResult<Money> {
        let balance: f64 = self
            .api
            .get_json(&[kind.path_segment(), "saldo"], &[])
            .await?;
        debug!(register = %kind, balance = balance, "Balance fetched");
        Ok(money_from_wire(balance))
    }

    /// Closes the register with the counted value.
    pub async fn close(&self, kind: CashRegisterKind, counted: Money) -> HttpResult<()> {
        let url = self.api.endpoint(&[kind.path_segment(), "cerrar"])?;
        self.api
            .send(
                self.api
                    .request(Method::POST, url)
                    .query(&[("valor", counted.pesos().to_string())]),
            )
            .await?;
        info!(register = %kind, counted = %counted, "Register closed");
        Ok(())
    }

    pub async fn history(
        &self,
        kind: CashRegisterKind,
        page: u32,
        size: u32,
    ) -> HttpResult<Page<ClosingRecord>> {
        let wire: WirePage<WireClosing> = self
            .api
            .get_json(
                &[kind.path_segment(), "historial"],
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await?;
        let history = wire.into_page(page, size);
        debug!(register = %kind, page = page, count = history.content.len(), "History fetched");
        Ok(history)
    }

    pub async fn status(&self, kind: CashRegisterKind) -> HttpResult<CashRegisterStatus> {
        let wire: WireStatus = self
            .api
            .get_json(&[kind.path_segment(), "estado"], &[])
            .await?;
        Ok(wire.into())
    }
}
