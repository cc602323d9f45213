pub mod types;
pub mod bus;

pub use types::ViewEvent;
pub use bus::{EventHandler, NotificationCenter, Subscription, SubscriptionId};
