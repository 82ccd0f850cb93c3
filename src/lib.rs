pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod front_matter;
pub mod lfs;
pub mod listing;
pub mod materialize;
pub mod output;
pub mod reconcile;
pub mod site;
pub mod store;
