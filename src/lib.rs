//! # Storekeeper (Inventory & Catalog API)
//!
//! `storekeeper` serves a small catalog over REST: users (the operators of the
//! catalog), product categories and products, all stored in `PostgreSQL`.
//!
//! ## Request Flow
//!
//! Every resource route walks the same steps inside a single request:
//!
//! 1. **API-key gate:** each route expects a static key in its own header
//!    (`add-user-header`, `header-get-products`, ...). Missing keys return
//!    `401`, wrong keys `403`.
//! 2. **Field validation:** required fields, trimming, non-negative numbers,
//!    role whitelist.
//! 3. **Reference checks:** the acting user (`last_op_id`) must exist, and for
//!    user administration must be an `admin`; products must point at an
//!    existing category.
//! 4. **Persistence:** one write through `sqlx`.
//!
//! ## Bookkeeping
//!
//! Rows carry a `last_op_id` (who wrote last) and a `created_timestamp` /
//! `lastupdate_timestamp` pair. There is no history beyond that.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
