pub mod error;
pub use error::{NestedValuesError, Result};

pub mod database;
pub use database::{
    Db, DbCollection, DbCommon, DbConfig, IdType, MemoryCollection, SchemaDict, JsonPrimitive,
    fields_map, FieldsMapOptions,
};

pub mod query;
pub use query::{Annotation, ColumnPath, Expr, Lookup, RowSource, Rows, ValuesQuery};

pub mod nested;
pub use nested::{
    CompiledLevel, CompiledSpec, FieldMapCompiler, FieldSpec, NestedRows, NestedSpec, NestedValues,
    NestedValuesQuery, RowLayout,
};
