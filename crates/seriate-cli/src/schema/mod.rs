pub mod matrix;
pub mod output;
