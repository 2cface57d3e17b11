//! Forumgate library.
//!
//! Reads and posts to heterogeneous forum backends (Discourse, Lemmy)
//! through one canonical model of posts, replies, authors and forums.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod config;
pub mod constants;
pub mod models;
pub mod system;
