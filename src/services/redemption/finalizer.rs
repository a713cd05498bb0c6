use chrono::{DateTime, Utc};

use super::RedemptionError;
use crate::services::host::TokenStore;

/// Consume the token with a conditional update.
///
/// Exactly one row must change. Zero rows means another request consumed the
/// token after this one validated it.
pub(super) async fn finalize(
    tokens: &dyn TokenStore,
    token: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), RedemptionError> {
    let affected = tokens
        .mark_used(token, user_id, now)
        .await
        .map_err(|e| RedemptionError::Persist(e.to_string()))?;

    match affected {
        0 => Err(RedemptionError::AlreadyRedeemed),
        1 => Ok(()),
        n => Err(RedemptionError::Persist(format!(
            "Token update touched {} rows",
            n
        ))),
    }
}
