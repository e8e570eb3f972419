//! Text utility nodes

pub mod replace;
pub mod word_counter;
