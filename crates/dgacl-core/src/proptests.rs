//! Property-based tests for the permission codec.
