// Export components
pub mod calendar;
pub mod notifier;

// Re-export the calendar handle
pub use calendar::CalendarHandle;
// Re-export the scheduler
pub use notifier::ReminderScheduler;
