use std::sync::Arc;

use time::Date;

use crate::clock::Clock;
use crate::config;
use crate::db::{Repositories, UserDirectory};
use crate::notifications::{Mailer, NotificationDispatcher};
use crate::services::{AppointmentService, AvailabilityService, SlotResolver};

#[derive(Clone)]
pub struct AppState {
    pub env: config::Config,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserDirectory>,
    pub appointments: Arc<AppointmentService>,
    pub availability: Arc<AvailabilityService>,
}

impl AppState {
    pub fn new(
        env: config::Config,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notifier = NotificationDispatcher::new(mailer, env.mail.from_address.clone());
        let resolver = Arc::new(SlotResolver::new(
            &env.booking,
            Arc::clone(&repos.appointments),
            Arc::clone(&repos.availability),
        ));

        let appointments = Arc::new(AppointmentService::new(
            Arc::clone(&repos.appointments),
            Arc::clone(&repos.users),
            Arc::clone(&resolver),
            notifier.clone(),
        ));
        let availability = Arc::new(AvailabilityService::new(
            Arc::clone(&repos.appointments),
            Arc::clone(&repos.availability),
            Arc::clone(&repos.users),
            resolver,
            notifier,
            env.booking.block_horizon_days,
        ));

        Self {
            env,
            clock,
            users: repos.users,
            appointments,
            availability,
        }
    }

    pub fn today(&self) -> Date {
        self.clock.today()
    }
}
