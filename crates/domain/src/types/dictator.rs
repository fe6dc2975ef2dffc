//! Dictator profiles and their achievements
//!
//! Wire shapes of the REST backend. The backend speaks camelCase JSON and
//! owns all timestamps, which are passed through as opaque strings.

use serde::{Deserialize, Serialize};

/// A dictator profile, owned by the user whose username it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictator {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub country: String,
    pub description: String,
    pub years_in_power: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// An achievement scoped to a dictator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields required to create a dictator profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDictatorRequest {
    pub username: String,
    pub name: String,
    pub country: String,
    pub description: String,
    pub years_in_power: String,
}

/// Create-or-update payload; the backend updates when `id` is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDictatorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub profile: CreateDictatorRequest,
}

impl UpsertDictatorRequest {
    /// Payload that creates a new profile
    #[must_use]
    pub fn create(profile: CreateDictatorRequest) -> Self {
        Self { id: None, profile }
    }

    /// Payload that overwrites the profile with the given id
    #[must_use]
    pub fn update(id: i64, profile: CreateDictatorRequest) -> Self {
        Self { id: Some(id), profile }
    }
}

impl From<&Dictator> for CreateDictatorRequest {
    fn from(dictator: &Dictator) -> Self {
        Self {
            username: dictator.username.clone(),
            name: dictator.name.clone(),
            country: dictator.country.clone(),
            description: dictator.description.clone(),
            years_in_power: dictator.years_in_power.clone(),
        }
    }
}

/// Fields required to create an achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAchievementRequest {
    pub title: String,
    pub description: String,
    pub year: i32,
}

/// Partial achievement update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAchievementRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dictator_deserializes_camel_case() {
        let value = json!({
            "id": 7,
            "username": "caesar",
            "name": "Gaius Julius Caesar",
            "country": "Rome",
            "description": "Crossed a river",
            "yearsInPower": "49-44 BC",
            "createdAt": "2024-03-01T10:00:00",
            "updatedAt": "2024-03-02T10:00:00",
            "achievements": [{
                "id": 1,
                "title": "Rubicon",
                "description": "Crossed it",
                "year": -49,
                "createdAt": "2024-03-01T10:00:00",
                "updatedAt": "2024-03-01T10:00:00"
            }]
        });

        let dictator: Dictator = serde_json::from_value(value).unwrap();
        assert_eq!(dictator.years_in_power, "49-44 BC");
        assert_eq!(dictator.achievements.len(), 1);
        assert_eq!(dictator.achievements[0].year, -49);
    }

    #[test]
    fn test_dictator_without_achievements_field() {
        let value = json!({
            "id": 1, "username": "u", "name": "n", "country": "c", "description": "d",
            "yearsInPower": "1", "createdAt": "t", "updatedAt": "t"
        });

        let dictator: Dictator = serde_json::from_value(value).unwrap();
        assert!(dictator.achievements.is_empty());
    }

    #[test]
    fn test_upsert_flattens_profile_and_omits_missing_id() {
        let profile = CreateDictatorRequest {
            username: "caesar".to_string(),
            name: "Caesar".to_string(),
            country: "Rome".to_string(),
            description: "Veni vidi vici".to_string(),
            years_in_power: "5".to_string(),
        };

        let create = serde_json::to_value(UpsertDictatorRequest::create(profile.clone())).unwrap();
        assert!(create.get("id").is_none());
        assert_eq!(create["yearsInPower"], "5");

        let update = serde_json::to_value(UpsertDictatorRequest::update(3, profile)).unwrap();
        assert_eq!(update["id"], 3);
        assert_eq!(update["username"], "caesar");
    }

    #[test]
    fn test_partial_achievement_update_skips_absent_fields() {
        let update = UpdateAchievementRequest { year: Some(1804), ..Default::default() };
        let value = serde_json::to_value(update).unwrap();

        assert_eq!(value, json!({ "year": 1804 }));
    }
}
