pub mod binder;
pub mod column_type;
pub mod executor;
pub mod schema;
