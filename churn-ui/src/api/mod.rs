//! HTTP handlers for churn-ui
//!
//! JSON API plus the server-rendered pages under [`ui`].

pub mod buildinfo;
pub mod dataset;
pub mod health;
pub mod predict;
pub mod ui;

pub use buildinfo::get_build_info;
pub use dataset::dataset_routes;
pub use health::{health_routes, schema_routes};
pub use predict::predict_routes;
pub use ui::ui_routes;
