//! Groups parsed records by state and renders the report text.
//!
//! Produced from the flat, input-ordered list of `PersonRecord`s returned by
//! the parser. Group order follows `states::STATE_REGISTRY`; record order
//! within a group is a stable sort by name, so equal names keep their input
//! order.

use std::collections::HashMap;
use std::fmt;

use crate::model::PersonRecord;
use crate::states::{State, STATE_REGISTRY};

/// Line prefix for each person in the rendered report.
pub const RECORD_PREFIX: &str = ".....";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// All records for one state, sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGroup {
    pub state: &'static State,
    pub people: Vec<PersonRecord>,
}

/// Non-empty state groups in canonical code order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedReport {
    pub groups: Vec<StateGroup>,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Buckets records by state code, keeping input order inside each bucket.
pub fn group_by_state(records: Vec<PersonRecord>) -> HashMap<String, Vec<PersonRecord>> {
    let mut by_state: HashMap<String, Vec<PersonRecord>> = HashMap::new();
    for record in records {
        by_state
            .entry(record.state_code.clone())
            .or_default()
            .push(record);
    }
    by_state
}

/// Builds the ordered report from validated records.
///
/// Every record's state code must be in the registry; the parser guarantees
/// this, so a stray code is a programming error rather than bad input and
/// panics.
pub fn build_report(records: Vec<PersonRecord>) -> GroupedReport {
    let mut by_state = group_by_state(records);

    let mut groups = Vec::new();
    for state in STATE_REGISTRY {
        let Some(mut people) = by_state.remove(state.code) else {
            continue;
        };
        // stable: ties keep insertion order
        people.sort_by(|a, b| a.name.cmp(&b.name));
        groups.push(StateGroup { state, people });
    }

    assert!(
        by_state.is_empty(),
        "records with unregistered state codes: {:?}",
        by_state.keys().collect::<Vec<_>>()
    );

    GroupedReport { groups }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl GroupedReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of people across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.people.len()).sum()
    }

    /// Renders the report text.
    ///
    /// Each group is the full state name followed by one line per person:
    ///   `..... {name}{street} {city} {state name}`
    /// Name and street are concatenated with no separator, matching the
    /// output clients of the old service already parse. Groups are joined
    /// by a single newline with nothing after the last one.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state.name)?;
        for person in &self.people {
            write!(
                f,
                "\n{} {}{} {} {}",
                RECORD_PREFIX, person.name, person.street_address, person.city, self.state.name
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for GroupedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
