//! A small poll service: create polls, vote on their options, read results,
//! list the open ones, close and delete them.
//!
//! [`poll::PollStore`] holds the rules. It sits on top of a [`db::PollMap`],
//! either in memory or in PostgreSQL, and is served over HTTP by [`routes`].

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod poll;
pub mod routes;
pub mod validation;

pub use error::{PollError, StorageError};
pub use models::{Poll, PollId, PollOption};
pub use poll::PollStore;
