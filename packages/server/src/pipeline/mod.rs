//! Declarative read pipelines.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s run against one
//! [`Collection`]. Documents are plain JSON objects whose keys are the
//! entity column names; joined arrays and computed fields are added under
//! the names the stages give them.
//!
//! The leading `Match`/`Sort`/`Skip`/`Limit` stages of a pipeline are handed
//! to the [`DocumentSource`] as a [`Query`]; a `Lookup` fetches its foreign
//! documents in one batched `IN` query. Everything else runs in memory.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

mod exec;
#[cfg(test)]
pub(crate) mod memory;
mod page;
mod source;

pub use exec::run;
pub use page::{Page, paginate};
pub use source::DocumentSource;

pub type Document = Map<String, Value>;

/// The stored collections a pipeline can start from or join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Videos,
    Comments,
    Likes,
    Subscriptions,
    Playlists,
    PlaylistVideos,
    WatchHistory,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field equals any of the values.
    In { field: String, values: Vec<Value> },
    /// Case-insensitive substring match on any of the fields.
    Text { fields: Vec<String>, query: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    pub fn text(fields: &[&str], query: impl Into<String>) -> Self {
        Filter::Text {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            query: query.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => {
                get_path(doc, field).is_some_and(|v| values_equal(v, value))
            }
            Filter::In { field, values } => get_path(doc, field)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
            Filter::Text { fields, query } => {
                let needle = query.to_lowercase();
                fields.iter().any(|field| {
                    get_path(doc, field)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// The part of a pipeline a [`DocumentSource`] evaluates itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl Query {
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

/// Computed field expressions for [`Stage::AddFields`]. Paths are dotted.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Copy of the value at a path, `null` if missing.
    Field(String),
    /// Length of the array at a path, 0 if missing.
    Size(String),
    /// Sum of a numeric field over the elements of an array.
    Sum { array: String, field: String },
    /// Whether any element of an array has `field == value`.
    Contains {
        array: String,
        field: String,
        value: Value,
    },
    First(String),
    Last(String),
    /// The value of `field` in each element of an array.
    Pluck { array: String, field: String },
    Literal(Value),
}

impl Expr {
    pub fn field(path: &str) -> Self {
        Expr::Field(path.to_string())
    }

    pub fn size(path: &str) -> Self {
        Expr::Size(path.to_string())
    }

    pub fn sum(array: &str, field: &str) -> Self {
        Expr::Sum {
            array: array.to_string(),
            field: field.to_string(),
        }
    }

    pub fn contains(array: &str, field: &str, value: impl Into<Value>) -> Self {
        Expr::Contains {
            array: array.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn first(path: &str) -> Self {
        Expr::First(path.to_string())
    }

    pub fn last(path: &str) -> Self {
        Expr::Last(path.to_string())
    }

    pub fn pluck(array: &str, field: &str) -> Self {
        Expr::Pluck {
            array: array.to_string(),
            field: field.to_string(),
        }
    }

    pub fn eval(&self, doc: &Document) -> Value {
        match self {
            Expr::Field(path) => get_path(doc, path).cloned().unwrap_or(Value::Null),
            Expr::Size(path) => Value::from(array_at(doc, path).len()),
            Expr::Sum { array, field } => {
                let items = array_at(doc, array);
                let numbers = items
                    .iter()
                    .filter_map(|item| item.as_object().and_then(|o| get_path(o, field)));
                sum_numbers(numbers)
            }
            Expr::Contains {
                array,
                field,
                value,
            } => Value::Bool(array_at(doc, array).iter().any(|item| {
                item.as_object()
                    .and_then(|o| get_path(o, field))
                    .is_some_and(|v| values_equal(v, value))
            })),
            Expr::First(path) => array_at(doc, path).first().cloned().unwrap_or(Value::Null),
            Expr::Last(path) => array_at(doc, path).last().cloned().unwrap_or(Value::Null),
            Expr::Pluck { array, field } => Value::Array(
                array_at(doc, array)
                    .iter()
                    .filter_map(|item| item.as_object().and_then(|o| get_path(o, field)))
                    .cloned()
                    .collect(),
            ),
            Expr::Literal(value) => value.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Projected {
    Path(String),
    Nested { path: String, projection: Projection },
}

/// Allowlist of output fields. Anything not listed is dropped and listed
/// paths that are missing come out as `null`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    fields: Vec<(String, Projected)>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(self, field: &str) -> Self {
        self.rename(field, field)
    }

    pub fn rename(self, name: &str, path: &str) -> Self {
        self.with(name, Projected::Path(path.to_string()))
    }

    /// Project the object (or each object of the array) at `path` with
    /// `projection`.
    pub fn nested(self, name: &str, path: &str, projection: Projection) -> Self {
        self.with(
            name,
            Projected::Nested {
                path: path.to_string(),
                projection,
            },
        )
    }

    /// Add an output field, replacing an earlier one of the same name.
    fn with(mut self, name: &str, projected: Projected) -> Self {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = projected,
            None => self.fields.push((name.to_string(), projected)),
        }
        self
    }

    pub fn apply(&self, doc: &Document) -> Document {
        let mut out = Document::new();
        for (name, projected) in &self.fields {
            let value = match projected {
                Projected::Path(path) => get_path(doc, path).cloned().unwrap_or(Value::Null),
                Projected::Nested { path, projection } => match get_path(doc, path) {
                    Some(Value::Object(inner)) => Value::Object(projection.apply(inner)),
                    Some(Value::Array(items)) => Value::Array(
                        items
                            .iter()
                            .filter_map(Value::as_object)
                            .map(|inner| Value::Object(projection.apply(inner)))
                            .collect(),
                    ),
                    _ => Value::Null,
                },
            };
            out.insert(name.clone(), value);
        }
        out
    }
}

/// Left join of `pipeline.collection` on `local_field == foreign_field`,
/// stored as an array under `as_field`.
///
/// Stages of the nested pipeline up to the first `Project`, `Skip` or
/// `Limit` run once over all joined documents and must keep
/// `foreign_field`; the rest run per joined group.
#[derive(Clone, Debug)]
pub struct Lookup {
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    pub pipeline: Pipeline,
}

#[derive(Clone, Debug)]
pub enum Stage {
    Match(Filter),
    Lookup(Lookup),
    AddFields(Vec<(String, Expr)>),
    /// Replace a joined array by its first element; drop the document when
    /// the array is empty.
    Collapse(String),
    Sort(Vec<SortKey>),
    Skip(u64),
    Limit(u64),
    Project(Projection),
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    pub collection: Collection,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn lookup(self, local_field: &str, foreign_field: &str, as_field: &str, pipeline: Pipeline) -> Self {
        self.stage(Stage::Lookup(Lookup {
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            as_field: as_field.to_string(),
            pipeline,
        }))
    }

    pub fn add_fields(self, fields: Vec<(&str, Expr)>) -> Self {
        self.stage(Stage::AddFields(
            fields
                .into_iter()
                .map(|(name, expr)| (name.to_string(), expr))
                .collect(),
        ))
    }

    pub fn collapse(self, field: &str) -> Self {
        self.stage(Stage::Collapse(field.to_string()))
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        self.stage(Stage::Sort(keys))
    }

    pub fn skip(self, n: u64) -> Self {
        self.stage(Stage::Skip(n))
    }

    pub fn limit(self, n: u64) -> Self {
        self.stage(Stage::Limit(n))
    }

    pub fn project(self, projection: Projection) -> Self {
        self.stage(Stage::Project(projection))
    }
}

/// Resolve a dotted path inside a document.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn array_at<'a>(doc: &'a Document, path: &str) -> &'a [Value] {
    match get_path(doc, path) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn sum_numbers<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut int_total: i128 = 0;
    let mut float_total: f64 = 0.0;
    let mut is_float = false;
    for value in values {
        if let Some(i) = value.as_i64() {
            int_total += i128::from(i);
        } else if let Some(f) = value.as_f64() {
            float_total += f;
            is_float = true;
        }
    }
    match i64::try_from(int_total) {
        Ok(total) if !is_float => Value::from(total),
        _ => Value::from(float_total + int_total as f64),
    }
}

pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Total order over document values used by in-memory sorts.
///
/// Timestamps are serialized with a variable number of fractional digits,
/// so strings that both parse as RFC 3339 are compared as instants.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

pub(crate) fn compare_docs(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let left = get_path(a, &key.field).unwrap_or(&Value::Null);
        let right = get_path(b, &key.field).unwrap_or(&Value::Null);
        let ordering = match key.direction {
            Direction::Asc => compare_values(left, right),
            Direction::Desc => compare_values(right, left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
