use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::key::normalize_key;
use crate::model::{Record, Table, Value};
use crate::normalize::{parse_date_lenient, value_is_blank};

// ---------------------------------------------------------------------------
// Column discovery
// ---------------------------------------------------------------------------

/// Columns the payroll tie-break policy consults, located by
/// case-insensitive substring over the table's headers.
struct PolicyColumns {
    status: Option<String>,
    termination_date: Option<String>,
    start_date: Option<String>,
    location: Option<String>,
    license: Option<String>,
}

fn locate(table: &Table) -> PolicyColumns {
    let find = |needle: &str| table.find_column_containing(needle).map(|c| c.to_string());
    PolicyColumns {
        status: find("position status"),
        termination_date: find("termination date"),
        start_date: find("position start date"),
        location: find("work location description"),
        license: find("license/certification id"),
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// First-occurrence dedup by canonical key. Used for the benefits table,
/// which is assumed already unique, and as the payroll fallback when no
/// position-status column can be located.
pub fn first_occurrence(table: &Table, key_field: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in &table.rows {
        if seen.insert(normalize_key(row.get(key_field))) {
            out.push(row.clone());
        }
    }
    out
}

/// Collapse multi-row payroll groups to one surviving record per canonical
/// key. Prefers the currently active assignment; among candidates of equal
/// standing, a non-blank work location, then a non-blank license id, then
/// the most recent relevant date win. Pure: returns a new collection.
pub fn reduce_payroll(table: &Table, key_field: &str) -> Vec<Record> {
    let cols = locate(table);
    if cols.status.is_none() {
        return first_occurrence(table, key_field);
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Record>> = HashMap::new();
    for row in &table.rows {
        let key = normalize_key(row.get(key_field));
        let group = groups.entry(key.clone()).or_default();
        if group.is_empty() {
            order.push(key);
        }
        group.push(row);
    }

    order
        .iter()
        .map(|key| pick_best(&groups[key], &cols).clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Best-row selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Active,
    Terminated,
    Other,
}

struct Candidate {
    index: usize,
    class: StatusClass,
    has_location: bool,
    has_license: bool,
    start_date: NaiveDate,
    termination_date: NaiveDate,
    termination_blank: bool,
    sort_date: NaiveDate,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Flag(bool),
    Date(NaiveDate),
}

type KeyFn = fn(&Candidate) -> SortKey;

/// Tie-break policies as ordered key lists, evaluated lexicographically.
/// Larger values win; an exact tie keeps the earlier row.
const ACTIVE_KEYS: &[KeyFn] = &[
    |c| SortKey::Flag(c.has_location),
    |c| SortKey::Flag(c.has_license),
    |c| SortKey::Date(c.sort_date),
];

const LICENSE_DATE_KEYS: &[KeyFn] = &[
    |c| SortKey::Flag(c.has_license),
    |c| SortKey::Date(c.sort_date),
];

fn pick_best<'r>(group: &[&'r Record], cols: &PolicyColumns) -> &'r Record {
    if group.len() == 1 {
        return group[0];
    }

    let candidates: Vec<Candidate> = group
        .iter()
        .enumerate()
        .map(|(index, record)| candidate(index, record, cols))
        .collect();

    let mut active = Vec::new();
    let mut terminated = Vec::new();
    let mut other = Vec::new();
    for c in candidates {
        match c.class {
            StatusClass::Active => active.push(c),
            StatusClass::Terminated => terminated.push(c),
            StatusClass::Other => other.push(c),
        }
    }

    if !active.is_empty() {
        return group[best(&active, ACTIVE_KEYS).index];
    }

    if !terminated.is_empty() {
        // A blank/non-blank mix of termination dates makes the termination
        // dating ambiguous; fall back to the start date for recency.
        let has_blank = terminated.iter().any(|c| c.termination_blank);
        let has_value = terminated.iter().any(|c| !c.termination_blank);
        let use_start = cols.termination_date.is_none() || (has_blank && has_value);
        for c in &mut terminated {
            c.sort_date = if use_start { c.start_date } else { c.termination_date };
        }
        return group[best(&terminated, LICENSE_DATE_KEYS).index];
    }

    group[best(&other, LICENSE_DATE_KEYS).index]
}

fn candidate(index: usize, record: &Record, cols: &PolicyColumns) -> Candidate {
    let status_col = cols.status.as_deref().unwrap_or_default();
    let class = match record.get(status_col).display().trim().to_lowercase().as_str() {
        "active" => StatusClass::Active,
        "terminated" => StatusClass::Terminated,
        _ => StatusClass::Other,
    };

    let non_blank = |col: &Option<String>| {
        col.as_deref()
            .map(|c| !value_is_blank(record.get(c)))
            .unwrap_or(false)
    };
    let date_of = |col: &Option<String>| {
        col.as_deref().map(|c| date_or_min(record.get(c))).unwrap_or(NaiveDate::MIN)
    };

    let start_date = date_of(&cols.start_date);
    Candidate {
        index,
        class,
        has_location: non_blank(&cols.location),
        has_license: non_blank(&cols.license),
        start_date,
        termination_date: date_of(&cols.termination_date),
        termination_blank: !non_blank(&cols.termination_date),
        sort_date: start_date,
    }
}

/// Missing or unparseable dates sort as the oldest possible date.
fn date_or_min(value: &Value) -> NaiveDate {
    if value_is_blank(value) {
        return NaiveDate::MIN;
    }
    match value {
        Value::Date(d) => *d,
        Value::Text(t) => parse_date_lenient(t).unwrap_or(NaiveDate::MIN),
        _ => NaiveDate::MIN,
    }
}

fn best<'a>(candidates: &'a [Candidate], keys: &[KeyFn]) -> &'a Candidate {
    let mut winner = &candidates[0];
    for challenger in &candidates[1..] {
        if beats(challenger, winner, keys) {
            winner = challenger;
        }
    }
    winner
}

fn beats(challenger: &Candidate, incumbent: &Candidate, keys: &[KeyFn]) -> bool {
    for key in keys {
        match key(challenger).cmp(&key(incumbent)) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
