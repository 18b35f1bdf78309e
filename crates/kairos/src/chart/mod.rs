pub mod birth;
pub mod cache;
pub mod natal;

pub use birth::BirthData;
pub use cache::{CacheStats, ChartCache, DEFAULT_CACHE_CAPACITY};
pub use natal::{
    equal_house_cusps, house_of, BigThree, ElementTally, HouseCusp, ModalityTally, NatalChart, PlacedBody,
    HOUSE_COUNT,
};
