//! Catalog query engine.
//!
//! Pure functions over a record snapshot:
//! - [`filter_records`] - conjunctive equality / membership filter
//! - [`group_count`] - two-axis counts for distribution charts
//! - [`distinct_values`] - the values offered by a filter widget
//! - [`histogram`] - binned distribution of a numeric field per group
//!
//! [`Catalog`] binds them to a [`CatalogStore`] borrowed from the caller.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult, ValidationFailure};
use crate::models::{canonical_number, DatasetMetadataRecord, Field};
use crate::store::CatalogStore;
use crate::validation::validate;

/// Filter criteria: field key (any form accepted by [`Field::parse`]) to the
/// desired value, or an array of values that must all match.
pub type Criteria = Map<String, Value>;

/// Group key -> value -> number of (exploded) rows.
pub type GroupCounts = BTreeMap<String, BTreeMap<String, usize>>;

/// Bin count of the age distribution chart.
pub const DEFAULT_BINS: usize = 20;

/// Largest bin count [`histogram`] accepts.
pub const MAX_BINS: usize = 1_000;

/// Equal-width bins of a numeric field, counted per group.
///
/// Every group shares the same `edges`, so the per-group counts can be drawn
/// on one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` ascending boundaries; empty when no record has both fields.
    pub edges: Vec<f64>,
    /// Group key -> one count per bin.
    pub counts: BTreeMap<String, Vec<usize>>,
}

/// Build criteria from `key=value` pairs. Repeated keys collect into an
/// array, so every value has to match.
pub fn criteria_from_pairs<I, K, V>(pairs: I) -> Criteria
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut criteria = Criteria::new();
    for (key, value) in pairs {
        let key = key.into();
        let value = Value::String(value.into());
        match criteria.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                criteria.insert(key, value);
            }
        }
    }
    criteria
}

// =============================================================================
// Filtering
// =============================================================================

/// Records satisfying every criterion, in their original order.
///
/// Unknown fields and falsy values (`null`, `false`, `0`, blank strings,
/// empty arrays and objects) impose no constraint. A scalar field matches on
/// equality, a set field on membership.
pub fn filter_records(
    records: &[DatasetMetadataRecord],
    criteria: &Criteria,
) -> Vec<DatasetMetadataRecord> {
    let mut active: Vec<(Field, Vec<String>)> = Vec::new();

    for (key, value) in criteria {
        let Some(field) = Field::parse(key) else {
            debug!(key = %key, "ignoring filter on unknown field");
            continue;
        };
        let wanted = wanted_values(value);
        if wanted.is_empty() {
            debug!(field = %field, "ignoring empty filter");
            continue;
        }
        active.push((field, wanted));
    }

    records
        .iter()
        .filter(|record| {
            active.iter().all(|(field, wanted)| {
                record.get(*field).is_some_and(|value| {
                    let have = value.elements();
                    wanted.iter().all(|w| have.contains(w))
                })
            })
        })
        .cloned()
        .collect()
}

/// Canonical strings of a criterion value; empty when the value is falsy.
fn wanted_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::Bool(true) => vec!["true".to_string()],
        Value::Number(n) => match n.as_u64() {
            Some(0) => Vec::new(),
            Some(u) => vec![u.to_string()],
            None => match n.as_f64() {
                Some(f) if f != 0.0 => vec![canonical_number(f)],
                _ => Vec::new(),
            },
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s.to_string()]
            }
        }
        Value::Array(items) => items.iter().flat_map(wanted_values).collect(),
        Value::Object(_) => Vec::new(),
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Count records per `group_field` value and `value_field` value.
///
/// Set-valued fields are exploded on either axis, so one record adds one to
/// every (group, value) cell of its cross product. Records lacking either
/// field are left out.
pub fn group_count(
    records: &[DatasetMetadataRecord],
    group_field: Field,
    value_field: Field,
) -> GroupCounts {
    let mut counts = GroupCounts::new();

    for record in records {
        let (Some(group), Some(value)) = (record.get(group_field), record.get(value_field)) else {
            continue;
        };
        let values = value.elements();
        for key in group.elements() {
            let row = counts.entry(key).or_default();
            for v in &values {
                *row.entry(v.clone()).or_insert(0) += 1;
            }
        }
    }

    counts
}

/// Sorted, de-duplicated values of a field across the records.
///
/// Numeric fields sort by value (`27` before `100`), the rest as text.
pub fn distinct_values(records: &[DatasetMetadataRecord], field: Field) -> Vec<String> {
    let mut values: Vec<String> = records
        .iter()
        .filter_map(|r| r.get(field))
        .flat_map(|v| v.elements())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if field.is_numeric() {
        let key = |s: &str| s.parse::<f64>().unwrap_or(f64::NAN);
        values.sort_by(|a, b| key(a).total_cmp(&key(b)).then_with(|| a.cmp(b)));
    }
    values
}

/// Distribution of `value_field` in `bins` equal-width bins per
/// `group_field` value.
///
/// The bins span the smallest to the largest value over all groups, and the
/// last bin includes its upper edge. When every value is the same the range
/// is widened by 0.5 on each side. Set-valued group fields are exploded like
/// in [`group_count`]. Records lacking either field are left out.
pub fn histogram(
    records: &[DatasetMetadataRecord],
    group_field: Field,
    value_field: Field,
    bins: usize,
) -> CatalogResult<Histogram> {
    if !value_field.is_numeric() {
        return Err(CatalogError::NotNumeric(value_field.name().to_string()));
    }
    if bins == 0 || bins > MAX_BINS {
        return Err(CatalogError::InvalidBins(bins));
    }

    let rows: Vec<(Vec<String>, f64)> = records
        .iter()
        .filter_map(|record| {
            let value = record.get(value_field)?.as_f64()?;
            let groups = record.get(group_field)?.elements();
            Some((groups, value))
        })
        .collect();

    let Some((mut lo, mut hi)) = rows
        .iter()
        .map(|(_, v)| *v)
        .fold(None, |range: Option<(f64, f64)>, v| match range {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
    else {
        return Ok(Histogram {
            edges: Vec::new(),
            counts: BTreeMap::new(),
        });
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = hi - lo;
    let mut edges: Vec<f64> = (0..bins)
        .map(|i| lo + width * i as f64 / bins as f64)
        .collect();
    edges.push(hi);

    let mut counts: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (groups, value) in rows {
        let bin = (((value - lo) / width * bins as f64).floor() as usize).min(bins - 1);
        for key in groups {
            counts.entry(key).or_insert_with(|| vec![0; bins])[bin] += 1;
        }
    }

    Ok(Histogram { edges, counts })
}

// =============================================================================
// Catalog
// =============================================================================

/// Query entry point over a caller-owned store.
pub struct Catalog<'s, S: CatalogStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: CatalogStore + ?Sized> Catalog<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Every stored record.
    pub fn records(&self) -> CatalogResult<Vec<DatasetMetadataRecord>> {
        Ok(self.store.snapshot()?)
    }

    pub fn filter(&self, criteria: &Criteria) -> CatalogResult<Vec<DatasetMetadataRecord>> {
        let records = self.store.snapshot()?;
        let matched = filter_records(&records, criteria);
        debug!(total = records.len(), matched = matched.len(), "filtered catalog");
        Ok(matched)
    }

    pub fn group_count(&self, group_field: &str, value_field: &str) -> CatalogResult<GroupCounts> {
        let group_field = parse_field(group_field)?;
        let value_field = parse_field(value_field)?;
        Ok(group_count(&self.store.snapshot()?, group_field, value_field))
    }

    pub fn distinct(&self, field: &str) -> CatalogResult<Vec<String>> {
        let field = parse_field(field)?;
        Ok(distinct_values(&self.store.snapshot()?, field))
    }

    pub fn histogram(
        &self,
        group_field: &str,
        value_field: &str,
        bins: usize,
    ) -> CatalogResult<Histogram> {
        let group_field = parse_field(group_field)?;
        let value_field = parse_field(value_field)?;
        histogram(&self.store.snapshot()?, group_field, value_field, bins)
    }

    /// Validate a raw submission and append it to the store.
    ///
    /// Returns the document id and the normalized record.
    pub fn submit(&self, raw: &Value) -> CatalogResult<(String, DatasetMetadataRecord)> {
        let record = validate(raw).map_err(ValidationFailure)?;
        let id = self.store.insert(record.clone())?;
        info!(id = %id, name = %record.name, "accepted dataset submission");
        Ok((id, record))
    }
}

fn parse_field(key: &str) -> CatalogResult<Field> {
    Field::parse(key).ok_or_else(|| CatalogError::UnknownField(key.to_string()))
}
