pub mod dedup;
pub mod delivery;
pub mod notifications;
mod scheduler;

pub use dedup::NotifiedStore;
pub use delivery::{DeliverySink, WebhookSink};
pub use scheduler::ReminderScheduler;
