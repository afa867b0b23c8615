pub mod display;
pub mod geometry;
pub mod headless;
pub mod rules;
