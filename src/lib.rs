pub mod commands;
pub mod error;
pub mod pkgconfig;
pub mod recipe;
pub mod runtime;
pub mod version;
