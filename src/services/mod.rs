//! Booking rules on top of the repositories.

mod contact;

pub mod appointments;
pub mod availability;
pub mod slots;

pub use appointments::AppointmentService;
pub use availability::{validate_block_request, AvailabilityService};
pub use slots::{open_slots, SlotCatalog, SlotResolver};
