pub mod analyzer;
pub mod editor;
pub mod input_metrics;
pub mod layout;
pub mod markup;
pub mod render;
