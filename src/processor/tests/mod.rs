//! Integration tests for the processor module
//!
//! Tests batch conversion using temporary directories of RDB files.
