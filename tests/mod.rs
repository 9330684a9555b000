//! Test suite for Event Log Pro
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
pub mod property;
