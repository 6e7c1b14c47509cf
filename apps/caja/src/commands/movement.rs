//! # Movement Commands
//!
//! Manual income and expenses of caja menor for a business day.

use chrono::NaiveDate;
use tracing::{info, warn};

use drogueria_core::cash::validate_movement;
use drogueria_core::{Money, Movement, MovementKind, NewMovement};
use drogueria_http::MovementBackend;

use crate::error::{PosError, PosResult};
use crate::notify::{Notice, Notifier};
use crate::state::SessionContext;

/// Movements recorded on `date`. A failed fetch shows a notice and yields
/// an empty list.
pub async fn list_for_date<B, N>(backend: &B, notifier: &N, date: NaiveDate) -> Vec<Movement>
where
    B: MovementBackend,
    N: Notifier,
{
    match backend.movements_for(date).await {
        Ok(movements) => movements,
        Err(e) => {
            warn!(%date, error = %e, "Could not load movements, showing none");
            notifier.notify(Notice::error(
                e.user_message("Could not load the day's movements"),
            ));
            Vec::new()
        }
    }
}

/// Records a movement. The value must be positive; a blank reason is sent
/// as "Sin descripción".
pub async fn create<B, N>(
    backend: &B,
    ctx: &SessionContext,
    notifier: &N,
    value: Money,
    kind: MovementKind,
    reason: &str,
) -> PosResult<NewMovement>
where
    B: MovementBackend,
    N: Notifier,
{
    let movement = match validate_movement(value, kind, reason) {
        Ok(movement) => movement,
        Err(e) => {
            let err = PosError::validation(e.to_string());
            notifier.notify(Notice::error(&err.message));
            return Err(err);
        }
    };

    match backend.create_movement(&movement).await {
        Ok(()) => {
            info!(value = %movement.value, kind = %movement.kind, "Movement recorded");
            notifier.notify(Notice::success(
                format!("{} of {} recorded", movement.kind, movement.value),
                ctx.success_notice,
            ));
            Ok(movement)
        }
        Err(e) => {
            let err = PosError::from_backend(e, "The movement could not be recorded");
            notifier.notify(Notice::error(&err.message));
            Err(err)
        }
    }
}

/// Deletes a movement by id.
pub async fn delete<B, N>(
    backend: &B,
    ctx: &SessionContext,
    notifier: &N,
    id: i64,
) -> PosResult<bool>
where
    B: MovementBackend,
    N: Notifier,
{
    match backend.delete_movement(id).await {
        Ok(deleted) => {
            info!(id, deleted, "Movement deleted");
            if deleted {
                notifier.notify(Notice::success("Movement deleted", ctx.success_notice));
            } else {
                notifier.notify(Notice::error(format!("Movement {} was not deleted", id)));
            }
            Ok(deleted)
        }
        Err(e) => {
            let err = PosError::from_backend(e, "The movement could not be deleted");
            notifier.notify(Notice::error(&err.message));
            Err(err)
        }
    }
}
