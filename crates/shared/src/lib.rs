//! Domain logic of the food tour client: route progress, arrival detection,
//! tour history and the account marker. Rendering and platform access live in
//! the frontend crate.

pub mod arrival;
pub mod auth;
pub mod favorites;
pub mod geo;
pub mod history;
pub mod models;
pub mod navigation;
pub mod report;
pub mod route_store;
pub mod search;
pub mod storage;

#[cfg(feature = "client")]
pub mod client;
