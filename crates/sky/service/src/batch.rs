//! Batch execution over a list of identifiers.

use sky_core::{ApiError, BatchResponse};

/// An operation applied to every identifier of a batch.
///
/// Each identifier is resolved to zero or more targets and the action runs
/// once per target. The batch records one entry per identifier.
#[trait_variant::make(Send)]
pub trait BatchAction: Send + Sync {
    type Target: Send;

    /// Resolve an identifier to its targets.
    fn resolve(&self, id: &str) -> Result<Vec<Self::Target>, ApiError>;

    /// Act on one resolved target of `id`.
    async fn act(&self, id: &str, target: Self::Target);
}

/// Run `action` over `ids` in order.
///
/// A failed resolution becomes an error entry for that identifier and the
/// batch moves on. The output has exactly one entry per input, in input order,
/// keyed by the input identifier.
pub async fn execute<A: BatchAction>(action: &A, ids: &[String]) -> BatchResponse {
    let mut response = BatchResponse::with_capacity(ids.len());

    for id in ids {
        match action.resolve(id) {
            Ok(targets) => {
                tracing::debug!(id = %id, targets = targets.len(), "resolved batch item");
                for target in targets {
                    action.act(id, target).await;
                }
                response.push_ok(id.as_str());
            }
            Err(error) => {
                tracing::info!(id = %id, error = %error, "batch item not resolved");
                response.push_err(id.as_str(), error);
            }
        }
    }

    response
}
