//! # Movement Repository
//!
//! Manual cash inflows and outflows.

use chrono::NaiveDate;
use reqwest::Method;
use tracing::{debug, info};

use drogueria_core::{Movement, NewMovement};

use crate::client::{read_optional_json, ApiClient};
use crate::error::HttpResult;
use crate::normalize::{movements_from_wire, WireMovement};

#[derive(Debug, Clone)]
pub struct MovementRepository {
    api: ApiClient,
}

impl MovementRepository {
    pub fn new(api: ApiClient) -> Self {
        MovementRepository { api }
    }

    /// Movements recorded on `date`.
    pub async fn for_date(&self, date: NaiveDate) -> HttpResult<Vec<Movement>> {
        let rows: Vec<WireMovement> = self
            .api
            .get_json(
                &["movimientos", "fecha"],
                &[("fecha", date.format("%Y-%m-%d").to_string())],
            )
            .await?;
        let movements = movements_from_wire(rows);
        debug!(date = %date, count = movements.len(), "Movements fetched");
        Ok(movements)
    }

    /// Records a movement. Value, kind and reason travel as query parameters.
    pub async fn create(&self, movement: &NewMovement) -> HttpResult<()> {
        let url = self.api.endpoint(&["movimientos", "crear"])?;
        let query = [
            ("valor", movement.value.pesos().to_string()),
            ("tipo", movement.kind.as_str().to_string()),
            ("motivo", movement.reason.clone()),
        ];

        self.api
            .send(self.api.request(Method::POST, url).query(&query))
            .await?;

        info!(
            value = %movement.value,
            kind = %movement.kind,
            reason = %movement.reason,
            "Movement created"
        );
        Ok(())
    }

    /// Deletes a movement; `false` when the backend says nothing was deleted.
    pub async fn delete(&self, id: i64) -> HttpResult<bool> {
        let url = self
            .api
            .endpoint(&["movimientos", "eliminar", &id.to_string()])?;
        let response = self.api.send(self.api.request(Method::DELETE, url)).await?;
        let deleted = read_optional_json::<bool>(response).await.unwrap_or(true);
        info!(id = id, deleted = deleted, "Movement deleted");
        Ok(deleted)
    }
}
