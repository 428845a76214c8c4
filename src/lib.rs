pub mod app;
pub mod braille;
pub mod data;
pub mod enrich;
pub mod map;
pub mod stats;
pub mod style;
pub mod ui;
