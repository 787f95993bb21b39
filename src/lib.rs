pub mod app;
pub mod config;
pub mod dispatch;
pub mod form;
pub mod graphql;
pub mod models;
pub mod validation;
