use chrono::{DateTime, Utc};

use parkwise_core::{Booking, BookingStatus, ReservationError};

/// Named lifecycle transitions. Each maps, together with the current status,
/// to at most one row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Approve,
    Reject,
    ConfirmPayment,
    Cancel,
    CheckIn,
    CheckOut,
    Expire,
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleAction::Approve => "approve",
            LifecycleAction::Reject => "reject",
            LifecycleAction::ConfirmPayment => "confirm payment",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::CheckIn => "check in",
            LifecycleAction::CheckOut => "check out",
            LifecycleAction::Expire => "expire",
        };
        f.write_str(s)
    }
}

/// Who is attempting the transition.
#[derive(Debug, Clone)]
pub enum Actor {
    /// A user identified by an opaque id, matched against the booking's
    /// holder or the resource's owner as the transition requires.
    User(String),
    /// System-initiated (payment callback, expiry sweeper).
    System,
}

impl Actor {
    fn id_for_log(&self) -> &str {
        match self {
            Actor::User(id) => id,
            Actor::System => "system",
        }
    }
}

/// Relation the actor must hold to the booking for a transition to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorRelation {
    Holder,
    ResourceOwner,
    HolderOrOwner,
    System,
}

#[derive(Debug, Clone, Copy)]
enum TimeGuard {
    /// Check-in opens a bounded number of minutes before window start.
    NotBeforeStartMinus { minutes: i64 },
}

#[derive(Debug, Clone, Copy)]
struct TransitionRule {
    required: ActorRelation,
    next: BookingStatus,
    guard: Option<TimeGuard>,
}

/// The state machine governing every booking mutation after creation.
///
/// Transitions live in one table keyed by (current status, action); `apply`
/// is the only entry point, so role preconditions are not duplicated across
/// operations and the machine is testable on its own.
pub struct BookingLifecycle {
    checkin_early_minutes: i64,
}

impl BookingLifecycle {
    pub fn new(checkin_early_minutes: i64) -> Self {
        Self {
            checkin_early_minutes,
        }
    }

    fn rule_for(&self, status: BookingStatus, action: LifecycleAction) -> Option<TransitionRule> {
        use BookingStatus::*;
        use LifecycleAction::*;

        let rule = match (status, action) {
            (Pending, Approve) => TransitionRule {
                required: ActorRelation::ResourceOwner,
                next: AwaitingPayment,
                guard: None,
            },
            (Pending, Reject) => TransitionRule {
                required: ActorRelation::ResourceOwner,
                next: Rejected,
                guard: None,
            },
            (AwaitingPayment, ConfirmPayment) => TransitionRule {
                required: ActorRelation::System,
                next: Confirmed,
                guard: None,
            },
            (Pending | AwaitingPayment | Confirmed, Cancel) => TransitionRule {
                required: ActorRelation::HolderOrOwner,
                next: Cancelled,
                guard: None,
            },
            (Confirmed, CheckIn) => TransitionRule {
                required: ActorRelation::Holder,
                next: InProgress,
                guard: Some(TimeGuard::NotBeforeStartMinus {
                    minutes: self.checkin_early_minutes,
                }),
            },
            (InProgress, CheckOut) => TransitionRule {
                required: ActorRelation::Holder,
                next: Completed,
                guard: None,
            },
            (Pending | AwaitingPayment, Expire) => TransitionRule {
                required: ActorRelation::System,
                next: Expired,
                guard: None,
            },
            _ => return None,
        };
        Some(rule)
    }

    /// Validate and apply one transition. On success the booking's status is
    /// updated (plus check-in/out instants); recording reasons, refunds and
    /// payments stays with the orchestrator.
    pub fn apply(
        &self,
        booking: &mut Booking,
        action: LifecycleAction,
        actor: &Actor,
        resource_owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        let rule = self.rule_for(booking.status, action).ok_or_else(|| {
            ReservationError::InvalidStateTransition {
                from: booking.status,
                action: action.to_string(),
            }
        })?;

        if !relation_satisfied(rule.required, actor, booking, resource_owner_id) {
            return Err(ReservationError::Unauthorized {
                actor: actor.id_for_log().to_string(),
                action: action.to_string(),
            });
        }

        if let Some(TimeGuard::NotBeforeStartMinus { minutes }) = rule.guard {
            // compare in seconds: num_minutes() truncates, which would admit
            // an attempt up to 59 seconds outside the window
            let seconds_until_start = (booking.window.starts_at - now).num_seconds();
            if seconds_until_start > minutes * 60 {
                return Err(ReservationError::TooEarly {
                    minutes_until_start: seconds_until_start / 60,
                });
            }
        }

        booking.update_status(rule.next);
        match action {
            LifecycleAction::CheckIn => booking.checked_in_at = Some(now),
            LifecycleAction::CheckOut => booking.checked_out_at = Some(now),
            _ => {}
        }
        Ok(())
    }
}

impl Default for BookingLifecycle {
    fn default() -> Self {
        Self::new(30)
    }
}

fn relation_satisfied(
    required: ActorRelation,
    actor: &Actor,
    booking: &Booking,
    resource_owner_id: &str,
) -> bool {
    match (required, actor) {
        (ActorRelation::System, Actor::System) => true,
        (ActorRelation::System, Actor::User(_)) => false,
        (_, Actor::System) => false,
        (ActorRelation::Holder, Actor::User(id)) => id == &booking.holder_id,
        (ActorRelation::ResourceOwner, Actor::User(id)) => id == resource_owner_id,
        (ActorRelation::HolderOrOwner, Actor::User(id)) => {
            id == &booking.holder_id || id == resource_owner_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use parkwise_core::booking::{PriceBreakdown, PricingTier, TimeWindow};
    use parkwise_core::DurationUnit;
    use uuid::Uuid;

    const OWNER: &str = "vendor-1";
    const HOLDER: &str = "member-9";

    fn booking_starting_in(minutes: i64) -> Booking {
        let start = Utc::now() + Duration::minutes(minutes);
        Booking::new(
            Uuid::new_v4(),
            HOLDER.to_string(),
            TimeWindow::new(start, start + Duration::hours(2)),
            PricingTier::Hourly,
            None,
            None,
            PriceBreakdown {
                base_minor: 10_000,
                tax_minor: 1_800,
                service_fee_minor: 500,
                discount_minor: 0,
                total_minor: 12_300,
                duration_value: 2,
                duration_unit: DurationUnit::Hours,
            },
        )
    }

    fn apply(
        lifecycle: &BookingLifecycle,
        booking: &mut Booking,
        action: LifecycleAction,
        actor: Actor,
    ) -> Result<(), ReservationError> {
        lifecycle.apply(booking, action, &actor, OWNER, Utc::now())
    }

    #[test]
    fn happy_path_to_completed() {
        let lifecycle = BookingLifecycle::default();
        let mut booking = booking_starting_in(15);

        apply(&lifecycle, &mut booking, LifecycleAction::Approve, Actor::User(OWNER.into())).unwrap();
        assert_eq!(booking.status, BookingStatus::AwaitingPayment);

        apply(&lifecycle, &mut booking, LifecycleAction::ConfirmPayment, Actor::System).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);

        apply(&lifecycle, &mut booking, LifecycleAction::CheckIn, Actor::User(HOLDER.into())).unwrap();
        assert_eq!(booking.status, BookingStatus::InProgress);
        assert!(booking.checked_in_at.is_some());

        apply(&lifecycle, &mut booking, LifecycleAction::CheckOut, Actor::User(HOLDER.into())).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.checked_out_at.is_some());
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        let lifecycle = BookingLifecycle::default();
        let actions = [
            LifecycleAction::Approve,
            LifecycleAction::Reject,
            LifecycleAction::ConfirmPayment,
            LifecycleAction::Cancel,
            LifecycleAction::CheckIn,
            LifecycleAction::CheckOut,
            LifecycleAction::Expire,
        ];

        for terminal in [
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
            BookingStatus::Expired,
        ] {
            for action in actions {
                let mut booking = booking_starting_in(60);
                booking.status = terminal;
                let err = apply(&lifecycle, &mut booking, action, Actor::System).unwrap_err();
                assert!(
                    matches!(err, ReservationError::InvalidStateTransition { .. }),
                    "{terminal} should admit no {action}"
                );
                assert_eq!(booking.status, terminal);
            }
        }
    }

    #[test]
    fn approve_requires_resource_owner() {
        let lifecycle = BookingLifecycle::default();
        let mut booking = booking_starting_in(60);

        let err = apply(
            &lifecycle,
            &mut booking,
            LifecycleAction::Approve,
            Actor::User(HOLDER.into()),
        )
        .unwrap_err();
        assert!(matches!(err, ReservationError::Unauthorized { .. }));
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn confirm_payment_rejects_user_actors() {
        let lifecycle = BookingLifecycle::default();
        let mut booking = booking_starting_in(60);
        booking.status = BookingStatus::AwaitingPayment;

        let err = apply(
            &lifecycle,
            &mut booking,
            LifecycleAction::ConfirmPayment,
            Actor::User(OWNER.into()),
        )
        .unwrap_err();
        assert!(matches!(err, ReservationError::Unauthorized { .. }));
    }

    #[test]
    fn cancel_allowed_for_holder_and_owner_while_cancellable() {
        let lifecycle = BookingLifecycle::default();
        for status in [
            BookingStatus::Pending,
            BookingStatus::AwaitingPayment,
            BookingStatus::Confirmed,
        ] {
            for who in [HOLDER, OWNER] {
                let mut booking = booking_starting_in(60);
                booking.status = status;
                apply(&lifecycle, &mut booking, LifecycleAction::Cancel, Actor::User(who.into()))
                    .unwrap();
                assert_eq!(booking.status, BookingStatus::Cancelled);
            }
        }

        // a stranger may not cancel
        let mut booking = booking_starting_in(60);
        let err = apply(
            &lifecycle,
            &mut booking,
            LifecycleAction::Cancel,
            Actor::User("someone-else".into()),
        )
        .unwrap_err();
        assert!(matches!(err, ReservationError::Unauthorized { .. }));
    }

    #[test]
    fn checkin_window_is_thirty_minutes() {
        let lifecycle = BookingLifecycle::default();

        // 15 minutes early: fine
        let mut booking = booking_starting_in(15);
        booking.status = BookingStatus::Confirmed;
        apply(&lifecycle, &mut booking, LifecycleAction::CheckIn, Actor::User(HOLDER.into()))
            .unwrap();
        assert_eq!(booking.status, BookingStatus::InProgress);

        // 90 minutes early: too early
        let mut booking = booking_starting_in(90);
        booking.status = BookingStatus::Confirmed;
        let err = apply(
            &lifecycle,
            &mut booking,
            LifecycleAction::CheckIn,
            Actor::User(HOLDER.into()),
        )
        .unwrap_err();
        assert!(matches!(err, ReservationError::TooEarly { .. }));
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn checkin_boundary_holds_to_the_second() {
        let lifecycle = BookingLifecycle::default();

        // 30m59s early: minute truncation would read this as exactly 30
        let start = Utc::now() + Duration::seconds(30 * 60 + 59);
        let mut booking = booking_starting_in(0);
        booking.window = TimeWindow::new(start, start + Duration::hours(2));
        booking.status = BookingStatus::Confirmed;

        let err = apply(
            &lifecycle,
            &mut booking,
            LifecycleAction::CheckIn,
            Actor::User(HOLDER.into()),
        )
        .unwrap_err();
        assert!(matches!(err, ReservationError::TooEarly { .. }));
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn expire_only_before_confirmation() {
        let lifecycle = BookingLifecycle::default();

        for status in [BookingStatus::Pending, BookingStatus::AwaitingPayment] {
            let mut booking = booking_starting_in(60);
            booking.status = status;
            apply(&lifecycle, &mut booking, LifecycleAction::Expire, Actor::System).unwrap();
            assert_eq!(booking.status, BookingStatus::Expired);
        }

        let mut booking = booking_starting_in(60);
        booking.status = BookingStatus::Confirmed;
        let err = apply(&lifecycle, &mut booking, LifecycleAction::Expire, Actor::System)
            .unwrap_err();
        assert!(matches!(err, ReservationError::InvalidStateTransition { .. }));
    }
}
