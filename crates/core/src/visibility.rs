//! Public visibility rule for beats.
//!
//! A beat is publicly visible when it is active and its scheduled release
//! (if any) has passed. [`is_publicly_visible`] is the in-process form and
//! [`VISIBLE_SQL`] the query form; repositories and diagnostics both go
//! through one of these two so the rule has a single definition.

use std::time::Duration;

use serde::Serialize;

use crate::types::Timestamp;

/// Shortest lifetime given to a listing that is about to change.
pub const MIN_LISTING_TTL: Duration = Duration::from_secs(1);

/// SQL predicate equivalent to [`is_publicly_visible`].
///
/// `{now}` must be replaced with the placeholder of the bound `now`
/// timestamp (e.g. `$1`) via [`visible_sql`].
pub const VISIBLE_SQL: &str =
    "(is_active = true AND (scheduled_release_at IS NULL OR scheduled_release_at <= {now}))";

/// SQL predicate selecting beats the activation job should flip to active.
pub const PENDING_ACTIVATION_SQL: &str =
    "(is_active = false AND scheduled_release_at IS NOT NULL AND scheduled_release_at <= {now})";

/// Render [`VISIBLE_SQL`] against the given bind placeholder.
pub fn visible_sql(now_placeholder: &str) -> String {
    VISIBLE_SQL.replace("{now}", now_placeholder)
}

/// Render [`PENDING_ACTIVATION_SQL`] against the given bind placeholder.
pub fn pending_activation_sql(now_placeholder: &str) -> String {
    PENDING_ACTIVATION_SQL.replace("{now}", now_placeholder)
}

/// Whether a beat with the given flags is visible to the public at `now`.
pub fn is_publicly_visible(
    is_active: bool,
    scheduled_release_at: Option<Timestamp>,
    now: Timestamp,
) -> bool {
    is_active && scheduled_release_at.map_or(true, |at| at <= now)
}

/// Whether the activation job would flip this beat to active at `now`.
pub fn is_pending_activation(
    is_active: bool,
    scheduled_release_at: Option<Timestamp>,
    now: Timestamp,
) -> bool {
    !is_active && scheduled_release_at.is_some_and(|at| at <= now)
}

/// Cache lifetime for a listing filtered by visibility at `now`.
///
/// Active beats with a future schedule turn visible without any write, so
/// the entry must expire no later than the soonest such release.
pub fn listing_ttl(base: Duration, next_release: Option<Timestamp>, now: Timestamp) -> Duration {
    match next_release.map(|at| (at - now).to_std()) {
        Some(Ok(until)) => base.min(until.max(MIN_LISTING_TTL)),
        Some(Err(_)) => MIN_LISTING_TTL,
        None => base,
    }
}

/// Diagnostic classification of a beat's release state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    /// Visible to the public.
    Live,
    /// Scheduled for a future release (regardless of the active flag).
    Scheduled,
    /// Release time has passed but the job has not activated it yet.
    PendingActivation,
    /// Inactive with no schedule.
    Draft,
}

impl ReleaseState {
    pub fn classify(
        is_active: bool,
        scheduled_release_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        if is_publicly_visible(is_active, scheduled_release_at, now) {
            Self::Live
        } else if is_pending_activation(is_active, scheduled_release_at, now) {
            Self::PendingActivation
        } else if scheduled_release_at.is_some() {
            Self::Scheduled
        } else {
            Self::Draft
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn active_without_schedule_is_visible() {
        assert!(is_publicly_visible(true, None, Utc::now()));
    }

    #[test]
    fn inactive_is_never_visible() {
        let now = Utc::now();
        assert!(!is_publicly_visible(false, None, now));
        assert!(!is_publicly_visible(false, Some(now - Duration::hours(1)), now));
    }

    #[test]
    fn future_schedule_hides_active_beat() {
        let now = Utc::now();
        assert!(!is_publicly_visible(true, Some(now + Duration::minutes(1)), now));
    }

    #[test]
    fn schedule_exactly_now_is_visible() {
        let now = Utc::now();
        assert!(is_publicly_visible(true, Some(now), now));
    }

    #[test]
    fn pending_activation_requires_inactive_and_past_schedule() {
        let now = Utc::now();
        let past = Some(now - Duration::minutes(1));
        let future = Some(now + Duration::minutes(1));
        assert!(is_pending_activation(false, past, now));
        assert!(!is_pending_activation(true, past, now));
        assert!(!is_pending_activation(false, future, now));
        assert!(!is_pending_activation(false, None, now));
    }

    #[test]
    fn classify_covers_each_state() {
        let now = Utc::now();
        let past = Some(now - Duration::minutes(5));
        let future = Some(now + Duration::days(1));
        assert_eq!(ReleaseState::classify(true, None, now), ReleaseState::Live);
        assert_eq!(ReleaseState::classify(true, past, now), ReleaseState::Live);
        assert_eq!(ReleaseState::classify(true, future, now), ReleaseState::Scheduled);
        assert_eq!(ReleaseState::classify(false, future, now), ReleaseState::Scheduled);
        assert_eq!(
            ReleaseState::classify(false, past, now),
            ReleaseState::PendingActivation
        );
        assert_eq!(ReleaseState::classify(false, None, now), ReleaseState::Draft);
    }

    #[test]
    fn listing_ttl_stops_at_next_release() {
        let now = Utc::now();
        let base = std::time::Duration::from_secs(300);
        assert_eq!(listing_ttl(base, None, now), base);
        assert_eq!(listing_ttl(base, Some(now + Duration::hours(2)), now), base);
        assert_eq!(
            listing_ttl(base, Some(now + Duration::seconds(90)), now),
            std::time::Duration::from_secs(90)
        );
        assert_eq!(
            listing_ttl(base, Some(now + Duration::milliseconds(200)), now),
            MIN_LISTING_TTL
        );
        assert_eq!(listing_ttl(base, Some(now - Duration::seconds(5)), now), MIN_LISTING_TTL);
    }

    #[test]
    fn sql_fragments_bind_the_given_placeholder() {
        assert_eq!(
            visible_sql("$3"),
            "(is_active = true AND (scheduled_release_at IS NULL OR scheduled_release_at <= $3))"
        );
        assert!(pending_activation_sql("$1").contains("scheduled_release_at <= $1"));
        assert!(!pending_activation_sql("$1").contains("{now}"));
    }
}
