//! Shared fixtures for batch integration tests.

#![allow(dead_code)]

pub mod fake_remote;
