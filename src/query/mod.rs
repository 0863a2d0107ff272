pub mod helpers;
pub use helpers::*;

pub mod column_path;
pub use column_path::*;

pub mod expr;
pub use expr::*;

pub mod lookup;
pub use lookup::*;

pub mod aggregate;
pub use aggregate::*;

pub mod row_source;
pub use row_source::*;

pub mod values_query;
pub use values_query::*;

#[cfg(test)]
pub mod _tests;
