pub mod config;
pub use config::*;

pub mod id_manager;
pub use id_manager::*;

pub mod db_collection;
pub use db_collection::*;

pub mod db;
pub use db::*;

pub mod schema;
pub use schema::*;

pub mod fields_map;
pub use fields_map::*;
