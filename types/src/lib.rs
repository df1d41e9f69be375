pub mod bits;
pub mod combined;
pub mod config;
pub mod consts;
pub mod containers;
pub mod error;
pub mod nonstandard;
pub mod primitives;
