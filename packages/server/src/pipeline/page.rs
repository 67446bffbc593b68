use sea_orm::DbErr;
use serde::Serialize;

use super::exec::{apply, leading_filters, run};
use super::{Document, DocumentSource, Pipeline, Stage};

/// One page of pipeline output plus total-count metadata.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[schema(value_type = Vec<Object>)]
    pub docs: Vec<Document>,
    /// Total number of matching documents across all pages.
    #[schema(example = 47)]
    pub total_docs: u64,
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of documents per page.
    #[schema(example = 10)]
    pub limit: u64,
    #[schema(example = 5)]
    pub total_pages: u64,
}

/// Run `pipeline` and return page `page` (1-based) of `limit` documents.
///
/// When nothing after the leading filters can drop or reorder documents, the
/// total comes from a count query and the window is pushed down to the
/// source. Otherwise the whole result is computed and sliced.
pub async fn paginate<S>(
    source: &S,
    pipeline: &Pipeline,
    page: u64,
    limit: u64,
) -> Result<Page, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let page = page.max(1);
    let limit = limit.max(1);
    let skip = (page - 1) * limit;

    let (prefix, rest) = leading_filters(&pipeline.stages);
    let windowable = !rest.iter().any(|s| {
        matches!(
            s,
            Stage::Match(_) | Stage::Collapse(_) | Stage::Sort(_) | Stage::Skip(_) | Stage::Limit(_)
        )
    });

    let (docs, total_docs) = if windowable {
        let total = source.count(pipeline.collection, &prefix.filters).await?;
        let mut query = prefix;
        query.skip = Some(skip);
        query.limit = Some(limit);
        let docs = source.find(pipeline.collection, &query).await?;
        (apply(source, docs, rest).await?, total)
    } else {
        let all = run(source, pipeline).await?;
        let total = all.len() as u64;
        let docs = all
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();
        (docs, total)
    };

    Ok(Page {
        docs,
        total_docs,
        page,
        limit,
        total_pages: total_docs.div_ceil(limit),
    })
}
