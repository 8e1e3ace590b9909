pub mod request;
pub mod table;
