pub mod comment;
pub mod like;
pub mod media;
pub mod playlist;
pub mod subscription;
pub mod user;
pub mod video;
