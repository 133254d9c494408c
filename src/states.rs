//! State registry for the address grouping service.
//!
//! Defines the closed set of U.S. postal codes the service accepts, in the
//! canonical order used both for validation and for report ordering. This is
//! the single source of truth for state codes; all other modules should
//! reference states from here rather than hardcoding codes or names.

// ---------------------------------------------------------------------------
// State metadata
// ---------------------------------------------------------------------------

/// A recognized state: two-letter postal code and full name.
#[derive(Debug, PartialEq, Eq)]
pub struct State {
    pub code: &'static str,
    pub name: &'static str,
}

/// All accepted states, ordered alphabetically by postal code.
///
/// Report groups are emitted in exactly this order; iteration never goes
/// through a hash map.
pub static STATE_REGISTRY: &[State] = &[
    State { code: "AZ", name: "Arizona" },
    State { code: "CA", name: "California" },
    State { code: "ID", name: "Idaho" },
    State { code: "IN", name: "Indiana" },
    State { code: "MA", name: "Massachusetts" },
    State { code: "OK", name: "Oklahoma" },
    State { code: "PA", name: "Pennsylvania" },
    State { code: "VA", name: "Virginia" },
];

/// Returns the postal codes in canonical order.
pub fn all_state_codes() -> Vec<&'static str> {
    STATE_REGISTRY.iter().map(|s| s.code).collect()
}

/// Looks up a state by postal code (case-sensitive). Returns `None` if the
/// code is not whitelisted.
pub fn find_state(code: &str) -> Option<&'static State> {
    STATE_REGISTRY.iter().find(|s| s.code == code)
}

/// Full name for a postal code, if whitelisted.
pub fn state_name(code: &str) -> Option<&'static str> {
    find_state(code).map(|s| s.name)
}

pub fn is_known_state(code: &str) -> bool {
    find_state(code).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
