//! Unit tests that span several core modules.

mod viewer_state_tests;
