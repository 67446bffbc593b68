use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::Value;

use super::{Collection, Document, DocumentSource, Filter, Query, compare_docs};

/// In-memory [`DocumentSource`] that records every query it receives.
#[derive(Default)]
pub(crate) struct MemorySource {
    collections: HashMap<Collection, Vec<Document>>,
    queries: Mutex<Vec<(Collection, Query)>>,
}

impl MemorySource {
    pub(crate) fn insert_json(&mut self, collection: Collection, docs: Vec<Value>) {
        let entries = self.collections.entry(collection).or_default();
        for doc in docs {
            match doc {
                Value::Object(map) => entries.push(map),
                other => panic!("expected an object, got {other}"),
            }
        }
    }

    pub(crate) fn insert<M: Serialize>(&mut self, collection: Collection, model: &M) {
        let value = serde_json::to_value(model).unwrap();
        self.insert_json(collection, vec![value]);
    }

    pub(crate) fn queries(&self) -> Vec<(Collection, Query)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, DbErr> {
        self.queries.lock().unwrap().push((collection, query.clone()));
        let mut docs: Vec<Document> = self
            .collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| compare_docs(a, b, &query.sort));
        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DbErr> {
        let count = self
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filters.iter().all(|f| f.matches(d)))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }
}
