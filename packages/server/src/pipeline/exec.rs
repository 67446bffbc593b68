use std::collections::HashMap;

use futures::FutureExt;
use futures::future::BoxFuture;
use sea_orm::DbErr;
use serde_json::Value;

use super::{
    DocumentSource, Document, Filter, Lookup, Pipeline, Query, Stage, compare_docs, get_path,
};

/// Run a pipeline to completion.
pub async fn run<S>(source: &S, pipeline: &Pipeline) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let (query, rest) = pushdown(&pipeline.stages);
    let docs = source.find(pipeline.collection, &query).await?;
    apply(source, docs, rest).await
}

/// Split off the leading stages a [`DocumentSource`] can evaluate.
pub(super) fn pushdown(stages: &[Stage]) -> (Query, &[Stage]) {
    let mut query = Query::default();
    let mut consumed = 0;
    for stage in stages {
        let windowed = query.skip.is_some() || query.limit.is_some();
        match stage {
            Stage::Match(filter) if !windowed => query.filters.push(filter.clone()),
            Stage::Sort(keys) if !windowed && query.sort.is_empty() => query.sort = keys.clone(),
            Stage::Skip(n) if query.limit.is_none() => {
                query.skip = Some(query.skip.unwrap_or(0) + n);
            }
            Stage::Limit(n) => query.limit = Some(query.limit.map_or(*n, |l| l.min(*n))),
            _ => break,
        }
        consumed += 1;
    }
    (query, &stages[consumed..])
}

/// Leading `Match`/`Sort` stages, evaluated by the source as part of a join
/// or count query.
pub(super) fn leading_filters(stages: &[Stage]) -> (Query, &[Stage]) {
    let mut query = Query::default();
    let mut consumed = 0;
    for stage in stages {
        match stage {
            Stage::Match(filter) => query.filters.push(filter.clone()),
            Stage::Sort(keys) if query.sort.is_empty() => query.sort = keys.clone(),
            _ => break,
        }
        consumed += 1;
    }
    (query, &stages[consumed..])
}

pub(super) fn apply<'a, S>(
    source: &'a S,
    mut docs: Vec<Document>,
    stages: &'a [Stage],
) -> BoxFuture<'a, Result<Vec<Document>, DbErr>>
where
    S: DocumentSource + ?Sized,
{
    async move {
        for stage in stages {
            docs = match stage {
                Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
                Stage::Lookup(lookup) => join(source, docs, lookup).await?,
                Stage::AddFields(fields) => {
                    for doc in &mut docs {
                        for (name, expr) in fields {
                            let value = expr.eval(doc);
                            doc.insert(name.clone(), value);
                        }
                    }
                    docs
                }
                Stage::Collapse(field) => docs
                    .into_iter()
                    .filter_map(|mut doc| {
                        let first = match doc.remove(field) {
                            Some(Value::Array(items)) => items.into_iter().next(),
                            _ => None,
                        }?;
                        doc.insert(field.clone(), first);
                        Some(doc)
                    })
                    .collect(),
                Stage::Sort(keys) => {
                    docs.sort_by(|a, b| compare_docs(a, b, keys));
                    docs
                }
                Stage::Skip(n) => docs.into_iter().skip(*n as usize).collect(),
                Stage::Limit(n) => docs.into_iter().take(*n as usize).collect(),
                Stage::Project(projection) => docs.iter().map(|d| projection.apply(d)).collect(),
            };
        }
        Ok(docs)
    }
    .boxed()
}

fn group_key(value: &Value) -> String {
    value.to_string()
}

/// Position of the first stage that has to see each joined group on its own.
fn per_group_start(stages: &[Stage]) -> usize {
    stages
        .iter()
        .position(|s| matches!(s, Stage::Project(_) | Stage::Skip(_) | Stage::Limit(_)))
        .unwrap_or(stages.len())
}

async fn join<S>(source: &S, mut docs: Vec<Document>, lookup: &Lookup) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let mut keys = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for doc in &docs {
        if let Some(value) = get_path(doc, &lookup.local_field)
            && !value.is_null()
            && seen.insert(group_key(value))
        {
            keys.push(value.clone());
        }
    }

    let (mut query, rest) = leading_filters(&lookup.pipeline.stages);
    let foreign = if keys.is_empty() {
        Vec::new()
    } else {
        query
            .filters
            .insert(0, Filter::is_in(lookup.foreign_field.clone(), keys));
        source.find(lookup.pipeline.collection, &query).await?
    };

    let split = per_group_start(rest);
    let foreign = apply(source, foreign, &rest[..split]).await?;

    let mut groups: HashMap<String, Vec<Document>> = HashMap::new();
    for doc in foreign {
        if let Some(value) = get_path(&doc, &lookup.foreign_field) {
            groups.entry(group_key(value)).or_default().push(doc);
        }
    }

    let tail = &rest[split..];
    if !tail.is_empty() {
        for group in groups.values_mut() {
            *group = apply(source, std::mem::take(group), tail).await?;
        }
    }

    for doc in &mut docs {
        let joined = get_path(doc, &lookup.local_field)
            .and_then(|value| groups.get(&group_key(value)))
            .map(|group| group.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default();
        doc.insert(lookup.as_field.clone(), Value::Array(joined));
    }

    Ok(docs)
}
