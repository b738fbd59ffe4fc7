//! Crate-level tests that drive the real HTTP client against a fake console.

mod support;
