pub mod estimate;
pub mod fallback;

pub use estimate::{EstimateSource, NutritionError, NutritionEstimate};
pub use fallback::{estimate, UNKNOWN_FOOD};
