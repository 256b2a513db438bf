pub mod components;
pub mod runtime;
pub mod theme;
pub mod view;
