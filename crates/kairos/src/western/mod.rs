//! Western zodiac vocabulary: signs, elements, modalities.

pub mod types;

pub use types::{Element, Modality, ZodiacPosition, ZodiacSign};
