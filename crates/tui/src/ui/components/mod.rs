pub mod json_preview;
pub mod text_input;
