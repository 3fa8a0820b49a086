use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use super::{DecisionNotice, Notification, RestoredNotice, UnavailabilityNotice};

const SIGNATURE: &str = "Regards,\nStyliste Team";

/// `Jun 10, 2024`
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!("[month repr:short] [day], [year]"))
}

/// `02:00 PM`
pub fn format_time(time: Time) -> Result<String, time::error::Format> {
    time.format(format_description!("[hour repr:12]:[minute] [period]"))
}

/// `Jun 11, 2024 at 10:00 AM`
pub fn format_slot(slot: PrimitiveDateTime) -> Result<String, time::error::Format> {
    slot.format(format_description!(
        "[month repr:short] [day], [year] at [hour repr:12]:[minute] [period]"
    ))
}

pub(super) fn render(notification: &Notification) -> Result<(String, String), time::error::Format> {
    match notification {
        Notification::Unavailability(n) => unavailability(n),
        Notification::Restored(n) => restored(n),
        Notification::Approved(n) => approved(n),
        Notification::Rejected(n) => rejected(n),
    }
}

fn unavailability(n: &UnavailabilityNotice) -> Result<(String, String), time::error::Format> {
    let mut body = format!(
        "Hello {},\n\n\
         We're sorry, but your appointment on {} at {} has been cancelled because \
         the salon is unavailable at that time.\n",
        n.recipient.name,
        format_date(n.date)?,
        format_time(n.time)?,
    );

    if n.alternatives.is_empty() {
        body.push_str("\nPlease contact us to find a new time that suits you.\n");
    } else {
        body.push_str("\nThese slots are still open if you would like to rebook:\n");
        for slot in &n.alternatives {
            body.push_str(&format!("  - {}\n", format_slot(*slot)?));
        }
    }
    body.push_str("\nWe apologise for the inconvenience.\n\n");
    body.push_str(SIGNATURE);

    Ok(("Your appointment has been cancelled".to_string(), body))
}

fn restored(n: &RestoredNotice) -> Result<(String, String), time::error::Format> {
    let body = format!(
        "Hello {},\n\n\
         Good news: the salon is available again and your appointment is confirmed.\n\n\
         Date: {}\nTime: {}\nService: {}\n\n{}",
        n.recipient.name,
        format_date(n.date)?,
        format_time(n.time)?,
        n.service,
        SIGNATURE,
    );
    Ok(("Your appointment is back on".to_string(), body))
}

fn approved(n: &DecisionNotice) -> Result<(String, String), time::error::Format> {
    let body = format!(
        "Hello {},\n\n\
         Your appointment has been confirmed.\n\n\
         Date: {}\nTime: {}\nService: {}\n\n\
         We look forward to serving you.\n\n{}",
        n.recipient.name,
        format_date(n.date)?,
        format_time(n.time)?,
        n.service,
        SIGNATURE,
    );
    Ok(("Appointment confirmed".to_string(), body))
}

fn rejected(n: &DecisionNotice) -> Result<(String, String), time::error::Format> {
    let body = format!(
        "Hello {},\n\n\
         We're sorry, your appointment request for {} at {} could not be accepted.\n\
         Please try booking another available slot.\n\n{}",
        n.recipient.name,
        format_date(n.date)?,
        format_time(n.time)?,
        SIGNATURE,
    );
    Ok(("Appointment request rejected".to_string(), body))
}
