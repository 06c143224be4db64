use super::domain::AppointmentStatus;

/// Statuses reachable from `current` by a hospital action.
pub fn allowed_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => {
            &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    allowed_transitions(status).is_empty()
}
