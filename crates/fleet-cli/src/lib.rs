//! Library components of the `fleet` CLI: inventory export loading, one-shot
//! table rendering and terminal output.

pub mod inventory;
pub mod render;
pub mod table;

pub use table::{TableRequest, render_inventory};
