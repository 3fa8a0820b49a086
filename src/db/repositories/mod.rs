//! Storage seams for the booking domain.
//!
//! Each trait has a Postgres implementation and an in-memory one
//! ([`MemoryStore`]) used by tests and by local runs without a database.

mod appointment_repository;
mod availability_repository;
mod memory;
mod user_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use appointment_repository::{AppointmentRepository, PgAppointmentRepository};
pub use availability_repository::{AvailabilityRepository, PgAvailabilityRepository};
pub use memory::MemoryStore;
pub use user_repository::{PgUserRepository, UserDirectory};

/// The set of repositories the services are wired with.
#[derive(Clone)]
pub struct Repositories {
    pub appointments: Arc<dyn AppointmentRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub users: Arc<dyn UserDirectory>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            appointments: Arc::new(PgAppointmentRepository::new(pool.clone())),
            availability: Arc::new(PgAvailabilityRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            appointments: Arc::new(store.clone()),
            availability: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
