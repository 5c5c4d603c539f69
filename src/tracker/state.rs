use crate::clients::ApiError;
use crate::model::{OrderRecord, OrderStatus};

/// What the tracking view renders.
///
/// `status == None` is the initial loading state. `error` is an overlay: a
/// failed fetch sets it without touching `status` or `eta_minutes`, so the
/// last good values stay on screen next to the error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingState {
    pub order_id: String,
    pub status: Option<OrderStatus>,
    pub eta_minutes: Option<u32>,
    /// True until the first successful fetch.
    pub loading: bool,
    pub error: Option<String>,
    /// The last failure was a 401; the user has to sign in again.
    pub reauth_required: bool,
}

impl TrackingState {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: None,
            eta_minutes: None,
            loading: true,
            error: None,
            reauth_required: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(OrderStatus::is_terminal)
    }

    /// Replaces status and ETA with the server's values and clears the error.
    ///
    /// A terminal state is frozen: later records are ignored. Returns whether
    /// anything changed.
    pub fn apply_record(&mut self, record: &OrderRecord) -> bool {
        if self.is_terminal() {
            return false;
        }
        let before = self.clone();
        self.status = Some(record.status);
        self.eta_minutes = Some(record.eta_minutes);
        self.loading = false;
        self.error = None;
        self.reauth_required = false;
        *self != before
    }

    /// Sets the error overlay, leaving the last good status untouched.
    pub fn apply_error(&mut self, error: &ApiError) -> bool {
        if self.is_terminal() {
            return false;
        }
        let before = self.clone();
        self.error = Some(error.to_string());
        self.reauth_required = error.requires_reauth();
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: OrderStatus, eta_minutes: u32) -> OrderRecord {
        OrderRecord {
            order_id: "1".into(),
            status,
            eta_minutes,
            created_at: None,
        }
    }

    #[test]
    fn test_error_keeps_last_good_status() {
        let mut state = TrackingState::new("1");
        state.apply_record(&record(OrderStatus::InProgress, 8));
        state.apply_error(&ApiError::Timeout);

        assert_eq!(state.status, Some(OrderStatus::InProgress));
        assert_eq!(state.eta_minutes, Some(8));
        assert!(!state.loading);
        assert!(state.error.is_some());

        state.apply_record(&record(OrderStatus::InProgress, 6));
        assert_eq!(state.error, None);
        assert_eq!(state.eta_minutes, Some(6));
    }

    #[test]
    fn test_error_before_first_success_stays_loading() {
        let mut state = TrackingState::new("1");
        state.apply_error(&ApiError::Unauthorized);
        assert!(state.loading);
        assert_eq!(state.status, None);
        assert!(state.reauth_required);
    }

    #[test]
    fn test_terminal_is_frozen() {
        let mut state = TrackingState::new("1");
        assert!(state.apply_record(&record(OrderStatus::Completed, 0)));
        assert!(state.is_terminal());
        assert!(!state.apply_record(&record(OrderStatus::Queued, 12)));
        assert!(!state.apply_error(&ApiError::Timeout));
        assert_eq!(state.status, Some(OrderStatus::Completed));
        assert_eq!(state.error, None);
    }
}
