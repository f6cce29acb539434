//! HTTP endpoints: profile creation, room create/join, history fetch.

mod client;
mod history;
mod profile;
mod room;

pub use client::ApiClient;
pub use history::fetch_history;
pub use profile::create_profile;
pub use room::create_room;
