pub mod field_spec;
pub use field_spec::*;

pub mod nested_spec;
pub use nested_spec::*;

pub mod compiled;
pub use compiled::*;

pub mod compiler;
pub use compiler::*;

pub mod position;
pub use position::*;

pub mod nested_values;
pub use nested_values::*;

pub mod nested_query;
pub use nested_query::*;
