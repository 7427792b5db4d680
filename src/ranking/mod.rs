// Grouping & ranking
//
// A sort specification selects one of a closed set of sortable fields and
// group aggregates. Each key maps to a fixed SQL fragment, so operator input
// never reaches query text.

pub mod groupkey;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DvrError;
use crate::recording::Recording;

/// What a rank is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// One rank per recording, keyed by basename
    Attribute,
    /// One rank per duplicate group, keyed by groupkey
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DvrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(DvrError::Other(format!("Unknown sort order '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    // Attribute scope
    Title,
    Channel,
    Date,
    Size,
    Length,
    Dropped,
    Good,
    Mastered,
    // Aggregate scope
    Count,
    AvgSize,
    MinSize,
    MaxSize,
    SumSize,
    AnyDropped,
    AnyGood,
    AnyMastered,
}

const ALL_SORT_KEYS: [SortKey; 16] = [
    SortKey::Title,
    SortKey::Channel,
    SortKey::Date,
    SortKey::Size,
    SortKey::Length,
    SortKey::Dropped,
    SortKey::Good,
    SortKey::Mastered,
    SortKey::Count,
    SortKey::AvgSize,
    SortKey::MinSize,
    SortKey::MaxSize,
    SortKey::SumSize,
    SortKey::AnyDropped,
    SortKey::AnyGood,
    SortKey::AnyMastered,
];

impl SortKey {
    /// Operator-facing label
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Channel => "channel",
            SortKey::Date => "date",
            SortKey::Size => "size",
            SortKey::Length => "length",
            SortKey::Dropped => "drop",
            SortKey::Good => "good",
            SortKey::Mastered => "mastered",
            SortKey::Count => "count",
            SortKey::AvgSize => "avg-size",
            SortKey::MinSize => "min-size",
            SortKey::MaxSize => "max-size",
            SortKey::SumSize => "sum-size",
            SortKey::AnyDropped => "any-drop",
            SortKey::AnyGood => "any-good",
            SortKey::AnyMastered => "any-mastered",
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            SortKey::Title
            | SortKey::Channel
            | SortKey::Date
            | SortKey::Size
            | SortKey::Length
            | SortKey::Dropped
            | SortKey::Good
            | SortKey::Mastered => Scope::Attribute,
            SortKey::Count
            | SortKey::AvgSize
            | SortKey::MinSize
            | SortKey::MaxSize
            | SortKey::SumSize
            | SortKey::AnyDropped
            | SortKey::AnyGood
            | SortKey::AnyMastered => Scope::Aggregate,
        }
    }

    /// SQL expression ranked on; a compile-time constant per key
    pub fn sql_expression(self) -> &'static str {
        match self {
            SortKey::Title => "groupkey",
            SortKey::Channel => "epg_channel",
            SortKey::Date => "timestamp",
            SortKey::Size => "file_size",
            SortKey::Length => "video_duration",
            SortKey::Dropped => "is_dropped",
            SortKey::Good => "is_good",
            SortKey::Mastered => "is_mastered",
            SortKey::Count => "COUNT(*)",
            SortKey::AvgSize => "AVG(file_size)",
            SortKey::MinSize => "MIN(file_size)",
            SortKey::MaxSize => "MAX(file_size)",
            SortKey::SumSize => "SUM(file_size)",
            SortKey::AnyDropped => "MAX(is_dropped)",
            SortKey::AnyGood => "MAX(is_good)",
            SortKey::AnyMastered => "MAX(is_mastered)",
        }
    }

    pub fn all() -> impl Iterator<Item = SortKey> {
        ALL_SORT_KEYS.into_iter()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = DvrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        SortKey::all().find(|key| key.label() == wanted).ok_or_else(|| {
            let labels: Vec<&str> = SortKey::all().map(SortKey::label).collect();
            DvrError::Other(format!("Unknown sort field '{}' (expected one of: {})", s, labels.join(", ")))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    pub fn scope(&self) -> Scope {
        self.key.scope()
    }
}

impl Default for SortSpec {
    /// Title ascending keeps duplicate clusters together on first load.
    fn default() -> Self {
        Self::new(SortKey::Title, SortOrder::Ascending)
    }
}

/// Rank key of a record under the given scope
pub fn rank_key(rec: &Recording, scope: Scope) -> &str {
    match scope {
        Scope::Attribute => &rec.file_basename,
        Scope::Aggregate => &rec.groupkey,
    }
}

/// Set each record's sortkey from the rank map; unranked records get 0.
pub fn assign_sortkeys<'a, I>(records: I, ranks: &HashMap<String, i64>, scope: Scope)
where
    I: IntoIterator<Item = &'a mut Recording>,
{
    for rec in records {
        rec.sortkey = ranks.get(rank_key(rec, scope)).copied().unwrap_or(0);
    }
}

/// Display order: sortkey, then groupkey, timestamp and basename so members of
/// one group stay adjacent and the order is total.
pub fn display_order(a: &Recording, b: &Recording) -> Ordering {
    a.sortkey
        .cmp(&b.sortkey)
        .then_with(|| a.groupkey.cmp(&b.groupkey))
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.file_basename.cmp(&b.file_basename))
}
