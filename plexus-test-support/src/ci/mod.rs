//! Helpers that read CI-provided tuning for test suites.

pub mod property_test_profile;
