//! Group-key derivation for folding line items into logical orders.

use common::GroupId;

use crate::records::LineItem;

/// Returns the group key for a line item.
///
/// A non-empty persisted `group_id` (assigned at checkout) is used
/// verbatim, keeping grouping stable across reloads. Legacy rows
/// without one fall back to a synthetic key derived from the client id
/// and the creation time truncated to the minute: rows from the same
/// client persisted within the same clock-minute fold into one group.
///
/// The fallback is a heuristic. A checkout that straddles a minute
/// boundary splits into two groups, and two rapid-fire checkouts by the
/// same client within one minute merge into one.
pub fn group_key(item: &LineItem) -> GroupId {
    if let Some(group_id) = &item.group_id
        && !group_id.is_empty()
    {
        return group_id.clone();
    }
    let minute = item.created_at.timestamp().div_euclid(60) * 60;
    GroupId::new(format!("CMD-{}-{}", minute, item.client_id))
}
