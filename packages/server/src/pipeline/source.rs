use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde::Serialize;
use serde_json::Value;

use super::{Collection, Direction, Document, Filter, Query};
use crate::entity::{
    comment, like, playlist, playlist_video, subscription, user, video, watch_history,
};
use crate::models::shared::escape_like;

/// Where pipelines read their documents from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, DbErr>;

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DbErr>;
}

#[async_trait]
impl DocumentSource for DatabaseConnection {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, DbErr> {
        match collection {
            Collection::Users => find_in::<user::Entity>(self, query).await,
            Collection::Videos => find_in::<video::Entity>(self, query).await,
            Collection::Comments => find_in::<comment::Entity>(self, query).await,
            Collection::Likes => find_in::<like::Entity>(self, query).await,
            Collection::Subscriptions => find_in::<subscription::Entity>(self, query).await,
            Collection::Playlists => find_in::<playlist::Entity>(self, query).await,
            Collection::PlaylistVideos => find_in::<playlist_video::Entity>(self, query).await,
            Collection::WatchHistory => find_in::<watch_history::Entity>(self, query).await,
        }
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DbErr> {
        match collection {
            Collection::Users => count_in::<user::Entity>(self, filters).await,
            Collection::Videos => count_in::<video::Entity>(self, filters).await,
            Collection::Comments => count_in::<comment::Entity>(self, filters).await,
            Collection::Likes => count_in::<like::Entity>(self, filters).await,
            Collection::Subscriptions => count_in::<subscription::Entity>(self, filters).await,
            Collection::Playlists => count_in::<playlist::Entity>(self, filters).await,
            Collection::PlaylistVideos => count_in::<playlist_video::Entity>(self, filters).await,
            Collection::WatchHistory => count_in::<watch_history::Entity>(self, filters).await,
        }
    }
}

async fn find_in<E>(db: &DatabaseConnection, query: &Query) -> Result<Vec<Document>, DbErr>
where
    E: EntityTrait,
    E::Model: Serialize,
{
    let mut select = filtered::<E>(&query.filters)?;
    for key in &query.sort {
        let order = match key.direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        };
        select = select.order_by(column::<E>(&key.field)?, order);
    }
    if let Some(skip) = query.skip {
        select = select.offset(Some(skip));
    }
    if let Some(limit) = query.limit {
        select = select.limit(Some(limit));
    }

    select
        .all(db)
        .await?
        .into_iter()
        .map(to_document)
        .collect()
}

async fn count_in<E>(db: &DatabaseConnection, filters: &[Filter]) -> Result<u64, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
{
    filtered::<E>(filters)?.count(db).await
}

fn filtered<E: EntityTrait>(filters: &[Filter]) -> Result<Select<E>, DbErr> {
    let mut select = E::find();
    for filter in filters {
        select = select.filter(condition::<E>(filter)?);
    }
    Ok(select)
}

fn column<E: EntityTrait>(name: &str) -> Result<E::Column, DbErr> {
    name.parse::<E::Column>()
        .map_err(|_| DbErr::Custom(format!("Unknown column '{name}'")))
}

fn condition<E: EntityTrait>(filter: &Filter) -> Result<Condition, DbErr> {
    let condition = match filter {
        Filter::Eq { field, value } => {
            Condition::all().add(column::<E>(field)?.eq(sql_value(value)?))
        }
        Filter::In { field, values } => {
            let values = values
                .iter()
                .map(sql_value)
                .collect::<Result<Vec<_>, _>>()?;
            Condition::all().add(column::<E>(field)?.is_in(values))
        }
        Filter::Text { fields, query } => {
            let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
            let mut any = Condition::any();
            for field in fields {
                any = any.add(
                    Expr::expr(Func::lower(Expr::col(column::<E>(field)?)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            any
        }
    };
    Ok(condition)
}

fn sql_value(value: &Value) -> Result<sea_orm::Value, DbErr> {
    match value {
        Value::String(s) => Ok(s.clone().into()),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i.into()),
            (None, Some(f)) => Ok(f.into()),
            _ => Err(DbErr::Custom(format!("Unsupported number {n}"))),
        },
        other => Err(DbErr::Custom(format!("Unsupported filter value {other}"))),
    }
}

fn to_document<M: Serialize>(model: M) -> Result<Document, DbErr> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DbErr::Custom(format!(
            "Model serialized to a non-object value: {other}"
        ))),
        Err(e) => Err(DbErr::Custom(e.to_string())),
    }
}
