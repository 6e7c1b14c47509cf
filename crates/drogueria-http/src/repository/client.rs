//! # Client Repository

use tracing::debug;

use drogueria_core::Client;

use crate::client::ApiClient;
use crate::error::{HttpError, HttpResult};
use crate::normalize::WireClient;

#[derive(Debug, Clone)]
pub struct ClientRepository {
    api: ApiClient,
}

impl ClientRepository {
    pub fn new(api: ApiClient) -> Self {
        ClientRepository { api }
    }

    /// Looks a client up by cédula.
    ///
    /// ## Returns
    /// * `Ok(Some(client))` - Client found
    /// * `Ok(None)` - The backend answered 404
    /// * `Err(HttpError)` - Any other failure
    pub async fn find(&self, cedula: &str) -> HttpResult<Option<Client>> {
        debug!(cedula = %cedula, "Looking up client");

        match self
            .api
            .get_json::<WireClient>(&["clientes", "obtener", cedula], &[])
            .await
        {
            Ok(wire) => Ok(Some(wire.into())),
            Err(err) if err.is_not_found() => Ok(None),
            // some deployments answer 200 with an empty body for unknown ids
            Err(HttpError::Decode { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
