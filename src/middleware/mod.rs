pub mod identity;
pub mod tracing;

pub use identity::{AdminUser, CurrentUser, USER_ID_HEADER};
