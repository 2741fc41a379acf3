//! Integration tests for Wikiscribe
//!
//! These tests use wiremock to stand in for both the wiki and the chat
//! completions endpoint, and run full crawls against a temporary database.

mod crawl_tests;
mod support;
