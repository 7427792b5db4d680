// Attribute state machine
//
// Flag transitions are a fixed table of guard + effect pairs keyed by command
// name. A failing guard skips that record; the rest of the batch still applies.

use std::fmt;
use std::str::FromStr;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::schema::save_recording;
use crate::error::{DvrError, Result};
use crate::recording::Recording;

pub struct Transition {
    pub name: &'static str,
    pub guard: fn(&Recording) -> bool,
    pub apply: fn(&mut Recording),
}

// Names are unique in the table, so they identify a transition
impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Transition {}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition").field(&self.name).finish()
    }
}

pub static TRANSITIONS: [Transition; 6] = [
    Transition { name: "drop", guard: |r| !r.is_mastered, apply: |r| r.is_dropped = true },
    Transition { name: "undrop", guard: |r| r.is_dropped, apply: |r| r.is_dropped = false },
    Transition { name: "good", guard: |r| !r.is_good, apply: |r| r.is_good = true },
    Transition { name: "ungood", guard: |r| r.is_good, apply: |r| r.is_good = false },
    Transition { name: "master", guard: |r| !r.is_dropped, apply: |r| r.is_mastered = true },
    Transition { name: "unmaster", guard: |r| r.is_mastered, apply: |r| r.is_mastered = false },
];

pub fn transition(name: &str) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One of the guarded flag transitions
    Flag(&'static Transition),
    SetComment(String),
}

impl Command {
    /// Comments are unguarded
    pub fn guard(&self, rec: &Recording) -> bool {
        match self {
            Command::Flag(t) => (t.guard)(rec),
            Command::SetComment(_) => true,
        }
    }

    pub fn apply(&self, rec: &mut Recording) {
        match self {
            Command::Flag(t) => (t.apply)(rec),
            Command::SetComment(text) => rec.comment = text.clone(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Flag(t) => f.write_str(t.name),
            Command::SetComment(_) => f.write_str("comment"),
        }
    }
}

impl FromStr for Command {
    type Err = DvrError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_ascii_lowercase();
        transition(&wanted)
            .map(Command::Flag)
            .ok_or_else(|| {
                let names: Vec<&str> = TRANSITIONS.iter().map(|t| t.name).collect();
                DvrError::Other(format!("Unknown command '{}' (expected one of: {})", s, names.join(", ")))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub changed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Apply one command to a single record and persist it.
///
/// Returns Ok(false) when the guard rejects the record. The in-memory record
/// is only updated after the store commit succeeds.
pub fn apply_to(conn: &Connection, rec: &mut Recording, command: &Command) -> Result<bool> {
    rec.check_invariants()?;
    if !command.guard(rec) {
        log::debug!("{} skipped for '{}'", command, rec.file_basename);
        return Ok(false);
    }

    let mut next = rec.clone();
    command.apply(&mut next);
    next.check_invariants()?;
    save_recording(conn, &next)?;

    *rec = next;
    log::debug!("{} applied to '{}'", command, rec.file_basename);
    Ok(true)
}

/// Apply a command across a selection; guard failures are collected, not raised.
pub fn apply_batch<'a, I>(conn: &Connection, records: I, command: &Command) -> Result<BatchOutcome>
where
    I: IntoIterator<Item = &'a mut Recording>,
{
    let mut outcome = BatchOutcome::default();
    for rec in records {
        if apply_to(conn, rec, command)? {
            outcome.changed.push(rec.file_basename.clone());
        } else {
            outcome.skipped.push(rec.file_basename.clone());
        }
    }
    Ok(outcome)
}
