mod scheduler_tests;
mod smoke_tests;

// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: Basic functionality tests to ensure nothing is broken
// - calendar_mock: Mocking the calendar source for testing without HTTP
// - calendar_feed_tests: Feed parsing, recurrence expansion and windowing
// - scheduler_tests: Tick-level behavior of the reminder scheduler
