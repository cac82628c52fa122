//! Client side of the Garage admin API.
//!
//! Every call from the dashboard's route handlers goes through
//! [`GarageClient`], which attaches the admin bearer token and turns failures
//! into [`GarageError`]. Handlers then pick an [`policy::ErrorPolicy`] to turn
//! that error into an HTTP status for the browser.

pub mod client;
pub mod error;
pub mod models;
pub mod policy;
pub mod usage;

pub use client::{GarageClient, RequestOptions, API_VERSION};
pub use error::{GarageError, NormalizedError};
pub use policy::ErrorPolicy;
