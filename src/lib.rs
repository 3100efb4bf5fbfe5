pub mod anki;
pub mod cache;
pub mod core;
pub mod dictionary;
pub mod persistence;
pub mod segmentation;
