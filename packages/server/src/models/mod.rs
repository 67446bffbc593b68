pub mod auth;
pub mod comment;
pub mod engagement;
pub mod playlist;
pub mod shared;
pub mod video;
