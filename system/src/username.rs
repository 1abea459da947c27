use std::collections::HashMap;

use crate::message::User;
use crate::types::{ConnectionId, DEFAULT_USERNAME, MAX_USERNAME_LEN};

/// Applies the display-name defaults before resolution: absent or empty
/// names become "Anonymous", everything is cut at the username limit on a
/// char boundary.
pub fn sanitize_username(candidate: Option<&str>) -> String {
    let name = match candidate {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_USERNAME,
    };
    name.chars().take(MAX_USERNAME_LEN).collect()
}

/// Returns a name guaranteed unique among all users other than `self_id`.
/// If the candidate is free it is returned unchanged; otherwise integer
/// suffixes are tried from 1 upward. Depends only on current registry
/// contents, so the result is deterministic.
pub fn resolve_username(
    candidate: &str,
    users: &HashMap<ConnectionId, User>,
    self_id: ConnectionId,
) -> String {
    let taken = |name: &str| {
        users
            .values()
            .any(|u| u.id != self_id && u.username == name)
    };

    if !taken(candidate) {
        return candidate.to_owned();
    }
    let mut suffix = 1u32;
    loop {
        let name = format!("{}{}", candidate, suffix);
        if !taken(&name) {
            return name;
        }
        suffix += 1;
    }
}
