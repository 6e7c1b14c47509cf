//! # Session Context
//!
//! Who is logged in and the store defaults every workflow reads. Built once
//! from [`CajaConfig`] and passed by reference; there are no globals.

use std::time::Duration;

use serde::Serialize;

use drogueria_core::TaxRate;

use crate::config::CajaConfig;

/// Per-login values shared by all workflows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Backend id of the operator; sent as `usuario` on every sale.
    pub user_id: i64,

    /// Bearer token, if the backend requires one.
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Cédula used when the buyer gives none.
    pub default_client_id: String,

    pub tax_rate: TaxRate,

    /// How long success notices stay up.
    pub success_notice: Duration,

    /// Re-ask the backend for removed products right before posting a sale.
    pub recheck_removed_on_submit: bool,
}

impl SessionContext {
    pub fn new(user_id: i64) -> Self {
        Self::from_config(&CajaConfig::default()).with_user(user_id)
    }

    pub fn from_config(config: &CajaConfig) -> Self {
        SessionContext {
            user_id: config.session.user_id,
            token: config.api.token.clone(),
            default_client_id: config.store.default_client_id.clone(),
            tax_rate: config.tax_rate(),
            success_notice: config.success_notice(),
            recheck_removed_on_submit: config.store.recheck_removed_on_submit,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
