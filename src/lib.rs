//! Bookshelf application library
//!
//! Wires the book module into the kernel, database and HTTP crates.

pub mod app;
pub mod modules;

pub use modules::book::{Book, BookError, BookService};
