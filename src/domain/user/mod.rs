pub mod model;

pub use model::{SubscriptionPlan, SubscriptionStatus, User, UserRow};
