use crate::db::{Appointment, UserDirectory};
use crate::error::AppResult;
use crate::notifications::Recipient;

/// Who to write to about an appointment: the linked account when there is
/// one, otherwise the contact details captured at booking time.
pub async fn recipient_for(users: &dyn UserDirectory, appointment: &Appointment) -> AppResult<Recipient> {
    if let Some(user_id) = appointment.user_id {
        if let Some(user) = users.find_by_id(user_id).await? {
            return Ok(Recipient {
                name: user.name,
                email: user.email,
            });
        }
    }
    Ok(Recipient {
        name: appointment.guest_name.clone(),
        email: appointment.guest_email.clone(),
    })
}
