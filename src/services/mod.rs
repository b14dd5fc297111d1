pub mod elo_calculator;
pub mod result_recorder;

pub use elo_calculator::*;
pub use result_recorder::*;
