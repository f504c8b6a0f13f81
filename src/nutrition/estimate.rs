use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    #[error("food name is empty")]
    EmptyFood,
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// Nutrition facts for one food item.
///
/// Fields are private: the only way to obtain a value is through
/// [`NutritionEstimate::new`], which validates every field at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEstimate")]
pub struct NutritionEstimate {
    food: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

#[derive(Deserialize)]
struct RawEstimate {
    food: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

impl TryFrom<RawEstimate> for NutritionEstimate {
    type Error = NutritionError;

    fn try_from(raw: RawEstimate) -> Result<Self, Self::Error> {
        Self::new(raw.food, raw.calories, raw.protein, raw.carbs, raw.fat)
    }
}

impl NutritionEstimate {
    pub fn new(
        food: impl Into<String>,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
    ) -> Result<Self, NutritionError> {
        let food = food.into().trim().to_string();
        if food.is_empty() {
            return Err(NutritionError::EmptyFood);
        }

        Ok(Self {
            food,
            calories: check_amount("calories", calories)?,
            protein: check_amount("protein", protein)?,
            carbs: check_amount("carbs", carbs)?,
            fat: check_amount("fat", fat)?,
        })
    }

    /// Builds an estimate from values known to satisfy the invariants
    /// (the fallback table and its placeholder).
    pub(super) fn trusted(food: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        debug_assert!(!food.trim().is_empty());
        Self {
            food: food.to_string(),
            calories,
            protein,
            carbs,
            fat,
        }
    }

    pub fn food(&self) -> &str {
        &self.food
    }

    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn protein(&self) -> f64 {
        self.protein
    }

    pub fn carbs(&self) -> f64 {
        self.carbs
    }

    pub fn fat(&self) -> f64 {
        self.fat
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<f64, NutritionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NutritionError::InvalidAmount { field, value })
    }
}

/// Where a session result came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EstimateSource {
    /// Parsed from the vision model's reply.
    Analyzed,
    /// Looked up locally after inference failed.
    Estimated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_food_name() {
        assert_eq!(
            NutritionEstimate::new("   ", 10.0, 1.0, 1.0, 1.0),
            Err(NutritionError::EmptyFood)
        );
    }

    #[test]
    fn rejects_negative_and_nan_amounts() {
        let negative = NutritionEstimate::new("Toast", 80.0, -1.0, 15.0, 1.0);
        assert!(matches!(
            negative,
            Err(NutritionError::InvalidAmount { field: "protein", .. })
        ));

        let nan = NutritionEstimate::new("Toast", f64::NAN, 1.0, 15.0, 1.0);
        assert!(matches!(
            nan,
            Err(NutritionError::InvalidAmount { field: "calories", .. })
        ));
    }

    #[test]
    fn trims_food_name() {
        let estimate = NutritionEstimate::new("  Oatmeal ", 150.0, 5.0, 27.0, 3.0).unwrap();
        assert_eq!(estimate.food(), "Oatmeal");
    }

    #[test]
    fn deserialize_goes_through_validation() {
        let bad: Result<NutritionEstimate, _> = serde_json::from_str(
            r#"{"food":"","calories":1,"protein":1,"carbs":1,"fat":1}"#,
        );
        assert!(bad.is_err());

        let good: NutritionEstimate = serde_json::from_str(
            r#"{"food":"Egg","calories":78,"protein":6,"carbs":0.6,"fat":5}"#,
        )
        .unwrap();
        assert_eq!(good.calories(), 78.0);
    }
}
