//! Book entity.

pub mod model;

pub use model::{Book, BookUpdate, NewBook};
