use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};

use crate::entity::{comment, playlist, video};
use crate::error::AppError;

/// A resource with a single owning user.
pub trait OwnedResource: EntityTrait {
    /// Name used in error messages, e.g. `"Video"`.
    const LABEL: &'static str;

    fn owner_of(model: &Self::Model) -> &str;
}

impl OwnedResource for video::Entity {
    const LABEL: &'static str = "Video";

    fn owner_of(model: &video::Model) -> &str {
        &model.owner_id
    }
}

impl OwnedResource for playlist::Entity {
    const LABEL: &'static str = "Playlist";

    fn owner_of(model: &playlist::Model) -> &str {
        &model.owner_id
    }
}

impl OwnedResource for comment::Entity {
    const LABEL: &'static str = "Comment";

    fn owner_of(model: &comment::Model) -> &str {
        &model.owner_id
    }
}

/// Load `id` and check that `caller_id` owns it.
///
/// Returns `NotFound` when the resource does not exist and
/// `PermissionDenied` when someone else owns it.
pub async fn find_owned<E, C>(db: &C, id: &str, caller_id: &str) -> Result<E::Model, AppError>
where
    E: OwnedResource,
    C: ConnectionTrait,
    String: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let model = E::find_by_id(id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", E::LABEL)))?;

    if E::owner_of(&model) != caller_id {
        return Err(AppError::PermissionDenied(format!(
            "You are not the owner of this {}",
            E::LABEL.to_lowercase()
        )));
    }

    Ok(model)
}
