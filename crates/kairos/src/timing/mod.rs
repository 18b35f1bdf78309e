pub mod profile;
pub mod scorer;
pub mod search;
pub mod void_of_course;

pub use profile::{ActionProfile, HouseTier, ProfileRegistry};
pub use scorer::{MatchedAspect, Penalty, PenaltyKind, Scorer, ScoringTable, TierPoints, TimedMoment};
pub use search::{BestTimingSearch, DayBest, SearchOutcome, SearchRequest, SkippedStep};
pub use void_of_course::{VoidOfCourseDetector, VoidResult};
