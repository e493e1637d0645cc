//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (user credentials, timeouts, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Second regular user, for non-owner scenarios
pub const OTHER_USER: &str = "otheruser";

/// Second regular user password
pub const OTHER_PASS: &str = "otherpass123";

/// Admin test user
pub const ADMIN_USER: &str = "admin";

/// Admin test user password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Server Configuration
// ============================================================================

/// Signing secret used by test servers
pub const TEST_TOKEN_SECRET: &str = "e2e-test-signing-secret";

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
