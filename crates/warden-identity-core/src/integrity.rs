//! Record fingerprint chain.
//!
//! `current_fingerprint` tracks the security-relevant fields as persisted;
//! `origin_fingerprint` is fixed at creation. Comparing the two tells a
//! verifier whether the record changed since enrollment, and recomputing the
//! current one tells whether it changed outside this crate.

use crate::types::{current_timestamp, IntegrityViolation, User};
use warden_crypto::{constant_time_compare, digest_from_hex, fingerprint_digest};

/// Fingerprint over id, stored password, display name, avatar and phone
pub fn fingerprint(user: &User) -> String {
    fingerprint_digest(&[
        &user.id,
        &user.password,
        &user.display_name,
        &user.avatar,
        &user.phone,
    ])
}

/// Set both fingerprints on a record about to be created
pub fn seal_new(user: &mut User) {
    let value = fingerprint(user);
    user.origin_fingerprint = value.clone();
    user.current_fingerprint = value;
}

/// Recompute the current fingerprint after a mutation
pub fn reseal(user: &mut User) {
    user.current_fingerprint = fingerprint(user);
}

/// True if the stored current fingerprint matches the record's fields
pub fn is_consistent(user: &User) -> bool {
    match (
        digest_from_hex(&user.current_fingerprint),
        digest_from_hex(&fingerprint(user)),
    ) {
        (Ok(stored), Ok(computed)) => constant_time_compare(&stored, &computed),
        _ => false,
    }
}

/// True if the record is unchanged since creation
pub fn unchanged_since_creation(user: &User) -> bool {
    is_consistent(user) && user.current_fingerprint == user.origin_fingerprint
}

/// Describe a mismatch, or `None` if the record is consistent
pub fn check(user: &User) -> Option<IntegrityViolation> {
    if is_consistent(user) {
        return None;
    }
    Some(IntegrityViolation {
        user_id: user.user_id(),
        stored_fingerprint: user.current_fingerprint.clone(),
        computed_fingerprint: fingerprint(user),
        origin_fingerprint: user.origin_fingerprint.clone(),
        detected_at: current_timestamp(),
    })
}
