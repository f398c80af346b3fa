//! Reservation status enumeration and transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use libris_core::{AppError, AppResult};

/// Lifecycle status of a reservation.
///
/// `Active` is the initial state; `Returned` and `Overdue` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// The book is out on loan.
    Active,
    /// The book was returned on time.
    Returned,
    /// The loan period elapsed without a return.
    Overdue,
}

impl ReservationStatus {
    /// Whether no further transition is permitted from this status
    /// under normal policy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Returned | Self::Overdue)
    }

    /// Whether the normal-policy state machine permits moving from
    /// `self` to `next`. Only `Active -> {Returned, Overdue}` is allowed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(self, Self::Active) && next.is_terminal()
    }

    /// Validate a normal-policy transition, returning `InvalidTransition`
    /// if it is not permitted. Administrative overrides bypass this.
    pub fn ensure_transition_to(&self, next: ReservationStatus) -> AppResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::invalid_transition(format!(
                "Cannot transition reservation from '{self}' to '{next}'"
            )))
        }
    }

    /// Whether an override from `self` to `next` returns a copy to the
    /// book's available pool. Only leaving `Active` for a terminal
    /// status credits a copy back.
    pub fn credits_copy_on_override(&self, next: ReservationStatus) -> bool {
        matches!(self, Self::Active) && next.is_terminal()
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "returned" => Ok(Self::Returned),
            "overdue" => Ok(Self::Overdue),
            _ => Err(AppError::validation(format!(
                "Invalid reservation status: '{s}'. Expected one of: active, returned, overdue"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::ErrorKind;

    #[test]
    fn test_active_is_initial_and_open() {
        assert!(!ReservationStatus::Active.is_terminal());
        assert!(ReservationStatus::Active.can_transition_to(ReservationStatus::Returned));
        assert!(ReservationStatus::Active.can_transition_to(ReservationStatus::Overdue));
    }

    #[test]
    fn test_terminal_states_admit_no_transition() {
        for terminal in [ReservationStatus::Returned, ReservationStatus::Overdue] {
            assert!(terminal.is_terminal());
            for next in [
                ReservationStatus::Active,
                ReservationStatus::Returned,
                ReservationStatus::Overdue,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
            let err = terminal
                .ensure_transition_to(ReservationStatus::Active)
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidTransition);
        }
    }

    #[test]
    fn test_active_to_active_is_rejected() {
        assert!(!ReservationStatus::Active.can_transition_to(ReservationStatus::Active));
    }

    #[test]
    fn test_copy_credit_rule() {
        use ReservationStatus::*;
        assert!(Active.credits_copy_on_override(Returned));
        assert!(Active.credits_copy_on_override(Overdue));
        assert!(!Active.credits_copy_on_override(Active));
        assert!(!Returned.credits_copy_on_override(Overdue));
        // Terminal -> Active is a destructive override: no copy movement.
        assert!(!Returned.credits_copy_on_override(Active));
    }
}
