//! Data models for harvested recipes.
//!
//! - [`Recipe`]: one detail page, keyed by the site's own numeric identifier
//! - [`Ingredient`]: one row of a recipe's ingredient list
//!
//! Field names match the JSON consumed by the recipe front-end, which is why
//! the yield count serializes as `yield`.

use serde::{Deserialize, Serialize};

/// A single recipe extracted from a detail page.
///
/// Optional numeric fields serialize as `null` when the page does not carry
/// them; they are never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Recipe {
    /// Identifier assigned by the source site.
    pub id: u32,
    pub title: String,
    /// Cooking time in minutes.
    pub cook_duration: u32,
    /// Preparation time in minutes, when the summary carries the marker.
    pub prep_duration: Option<u32>,
    /// Absolute URL of the recipe photo.
    pub img_url: String,
    pub comment: String,
    /// Energy in kcal.
    pub calorie: u32,
    pub genre: String,
    pub difficulty: String,
    /// Steps in page order.
    pub instructions: Vec<String>,
    /// Number of people served.
    #[serde(rename = "yield")]
    pub yield_count: Option<u32>,
    pub ingredients: Vec<Ingredient>,
}

/// One ingredient row.
///
/// `name` never contains the text split out into `detail` or `marking`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Ingredient {
    pub name: String,
    /// Quantity text, omitted when the page gives none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Parenthetical qualifier, e.g. a preparation note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Cross-reference annotation such as `A` for a sauce group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marking: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recipe {
        Recipe {
            id: 1469,
            title: "野菜の肉巻き".to_string(),
            cook_duration: 30,
            prep_duration: None,
            img_url: "http://www.club.t-fal.co.jp/img/1469.jpg".to_string(),
            comment: "根菜をたっぷりとれるヘルシーおかず。".to_string(),
            calorie: 350,
            genre: "和風".to_string(),
            difficulty: "普通".to_string(),
            instructions: vec!["切る".to_string(), "巻く".to_string()],
            yield_count: Some(4),
            ingredients: vec![
                Ingredient {
                    name: "しょうゆ".to_string(),
                    amount: Some("大さじ1".to_string()),
                    detail: Some("減塩".to_string()),
                    marking: Some("A".to_string()),
                },
                Ingredient {
                    name: "塩".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_recipe_serialization_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["yield"], 4);
        assert!(json["prep_duration"].is_null());
        assert!(json.get("yield_count").is_none());
    }

    #[test]
    fn test_absent_ingredient_fields_are_omitted() {
        let json = serde_json::to_string(&sample().ingredients[1]).unwrap();
        assert_eq!(json, r#"{"name":"塩"}"#);
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("野菜の肉巻き"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_recipe_deserialization() {
        let json = r#"{
            "id": 1430,
            "title": "t",
            "cook_duration": 12,
            "prep_duration": 15,
            "img_url": "",
            "comment": "",
            "calorie": 200,
            "genre": "中華風",
            "difficulty": "簡単",
            "instructions": [],
            "yield": null,
            "ingredients": [{"name": "卵", "amount": "2個"}]
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.prep_duration, Some(15));
        assert_eq!(recipe.yield_count, None);
        assert_eq!(recipe.ingredients[0].amount.as_deref(), Some("2個"));
        assert_eq!(recipe.ingredients[0].detail, None);
    }
}
