//! Server wiring and startup logic.

pub(crate) mod http_api;
mod server;
mod usecase_container;

pub(crate) use server::ServeError;
pub(crate) use server::run_server;
