mod admin_availability;
mod appointment;
mod page;
mod user;

pub use admin_availability::*;
pub use appointment::*;
pub use page::*;
pub use user::*;

/// Serde adapters for the wire formats of dates and slot times.
pub mod formats {
    use time::{Date, Time};

    time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");
    time::serde::format_description!(pub hour_minute, Time, "[hour]:[minute]");
}
