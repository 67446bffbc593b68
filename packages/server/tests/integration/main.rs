mod common;

mod comments;
mod playlists;
mod subscriptions;
mod users;
mod videos;
