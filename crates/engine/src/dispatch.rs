use std::time::Instant;

use inview_api::CatalogSource;
use inview_types::Resource;
use tracing::debug;

use crate::coordinator::{LookupRequest, LookupResponse};

/// Run one lookup against `source` and pair the result with its request.
///
/// Never fails: errors travel inside the response so the coordinator can
/// decide whether they are still relevant.
pub async fn execute_lookup(source: &dyn CatalogSource, request: LookupRequest) -> LookupResponse {
    let started = Instant::now();
    let response = match request.resource {
        Resource::Connections => {
            let result = source.connections(&request.query).await;
            LookupResponse::Connections { request, result }
        }
        Resource::Variables => {
            let result = source.variables(&request.query).await;
            LookupResponse::Variables { request, result }
        }
    };
    debug!(
        resource = %response.request().resource,
        token = response.request().token.value(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "lookup settled"
    );
    response
}
