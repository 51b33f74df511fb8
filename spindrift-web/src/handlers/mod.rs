//! HTTP request handlers.

pub mod api;
pub mod range;
pub mod streaming;

pub use api::{add_torrent, health, list_torrents, remove_torrent, torrent_status};
pub use streaming::stream_file;
