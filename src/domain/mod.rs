pub mod entities;
pub mod error;
pub mod filter;
pub mod scroller;
