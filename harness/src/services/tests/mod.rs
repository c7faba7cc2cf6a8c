//! Tests for harness services
//!
//! These tests drive the real subscription task against a live channel,
//! checking that delivered records reach the classifier and that removal
//! stops consumption.
