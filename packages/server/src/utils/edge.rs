//! Set-semantics writes on tables keyed by a compound primary key.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, DbErr, EntityTrait, Iterable, PrimaryKeyToColumn,
    QueryFilter,
};

/// Insert `model` unless a row with the same primary key exists.
///
/// Returns `true` if a row was inserted.
pub async fn insert_if_absent<A, C>(db: &C, model: A) -> Result<bool, DbErr>
where
    A: ActiveModelTrait + Send,
    C: ConnectionTrait,
{
    let key_columns = <A::Entity as EntityTrait>::PrimaryKey::iter().map(|pk| pk.into_column());

    let result = <A::Entity as EntityTrait>::insert(model)
        .on_conflict(OnConflict::columns(key_columns).do_nothing().to_owned())
        .exec_without_returning(db)
        .await;

    match result {
        Ok(inserted) => Ok(inserted > 0),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete the edge matching `key`, or insert `model` if there was none.
///
/// Both branches are single statements against the primary key, so two
/// racing toggles can never leave a duplicate edge behind. Returns `true`
/// if the edge exists afterwards.
pub async fn toggle<A, C>(db: &C, key: Condition, model: A) -> Result<bool, DbErr>
where
    A: ActiveModelTrait + Send,
    C: ConnectionTrait,
{
    let deleted = <A::Entity as EntityTrait>::delete_many()
        .filter(key)
        .exec(db)
        .await?;

    if deleted.rows_affected > 0 {
        return Ok(false);
    }

    insert_if_absent(db, model).await?;
    Ok(true)
}
