pub mod comments;
pub mod error;
pub mod posts;
pub mod routes;
pub mod state;
pub mod users;

mod convert;
mod validation;
