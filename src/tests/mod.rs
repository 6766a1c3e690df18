//! Scenario suites that exercise several modules together

mod account_decode_tests;
mod authority_tests;
