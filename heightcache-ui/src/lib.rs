pub mod events;
pub mod observed;
pub mod registry;
pub mod list_view;

pub use events::{EventHandler, NotificationCenter, Subscription, SubscriptionId, ViewEvent};
pub use observed::ObservedHeightCache;
pub use registry::{CacheRegistry, ViewId};
pub use list_view::ListView;
