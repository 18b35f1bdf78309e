pub mod calculator;
pub mod types;

pub use calculator::{AspectCalculator, DEFAULT_ORB};
pub use types::{Aspect, AspectTarget, AspectType};
