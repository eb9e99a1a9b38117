//! redactdb — scan a SQLite database's text columns for embedded secret
//! tokens (vendor API keys, bearer tokens, JWTs) and rewrite them into a
//! redacted, partially-identifiable form.
//!
//! Apply mode is transactional: a pre-apply backup, an exclusive-write
//! transaction, and an independent post-mutation verification pass
//! guarantee the store ends either fully redacted or byte-for-byte
//! unchanged. Dry-run (the default) previews the same metrics with zero
//! writes.

pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod patterns;
pub mod report;
pub mod runner;
pub mod scan;
