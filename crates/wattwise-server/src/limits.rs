use std::net::SocketAddr;

use wattwise_cache::OutboundRequest;

use crate::error::ApiError;
use crate::state::AppState;

pub const GLOBAL_SCOPE: &str = "global";
pub const USER_SCOPE: &str = "user";

/// Count an upstream call against the global and per-caller budgets.
///
/// Requests already in the cache cost nothing. Exceeding either budget is
/// logged, and rejected only when enforcement is switched on.
pub async fn gate(
    state: &AppState,
    request: &OutboundRequest,
    caller: Option<SocketAddr>,
) -> Result<(), ApiError> {
    if state.fetcher.contains(request).await? {
        return Ok(());
    }

    let identity = caller.map(|addr| addr.ip().to_string());
    let identity = identity.as_deref().unwrap_or("unknown");

    let over_global = state
        .limiter
        .test(&state.limits.global, GLOBAL_SCOPE, None)
        .await?;
    let over_user = state
        .limiter
        .test(&state.limits.user, USER_SCOPE, Some(identity))
        .await?;

    if over_global || over_user {
        tracing::warn!(
            caller = identity,
            over_global,
            over_user,
            enforced = state.limits.enforce,
            "Rate limit exceeded"
        );
        if state.limits.enforce {
            return Err(ApiError::RateLimited);
        }
    }

    Ok(())
}
