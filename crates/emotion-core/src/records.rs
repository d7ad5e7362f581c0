//! Wire types shared between the model, the admin store and the HTTP layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A classified emotion for one piece of text.
///
/// Serialised as `{"emotion": ..., "confidence": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub emotion: String,
    /// Highest class probability, or 1.0 for classifiers without probabilities.
    pub confidence: f64,
}

/// A user document from the `users` collection.
///
/// `uid` is the identity-provider id and doubles as the document id. Fields
/// other than `name` and `role` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Build a record from a document id and its stored fields.
    pub fn from_fields(uid: &str, mut fields: Map<String, Value>) -> Self {
        // The document id is authoritative; a stored `uid` field is redundant.
        fields.remove("uid");
        let name = take_string(&mut fields, "name");
        let role = take_string(&mut fields, "role");
        Self {
            uid: uid.to_string(),
            name,
            role,
            extra: fields,
        }
    }
}

/// Partial update of a user document. Only supplied fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserUpdate {
    /// The fields to write. Empty strings count as not supplied.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = self.name.as_deref().filter(|s| !s.is_empty()) {
            fields.insert("name".into(), Value::String(name.to_string()));
        }
        if let Some(role) = self.role.as_deref().filter(|s| !s.is_empty()) {
            fields.insert("role".into(), Value::String(role.to_string()));
        }
        fields
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        // Not a string: leave it in place rather than lose it.
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prediction_serialises_as_emotion() {
        let p = Prediction {
            emotion: "joy".into(),
            confidence: 0.75,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, json!({"emotion": "joy", "confidence": 0.75}));
    }

    #[test]
    fn user_record_keeps_extra_fields() {
        let fields = json!({"name": "Ada", "role": "admin", "email": "ada@example.com"});
        let Value::Object(map) = fields else {
            unreachable!()
        };
        let user = UserRecord::from_fields("u1", map);
        assert_eq!(user.uid, "u1");
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.role.as_deref(), Some("admin"));

        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["uid"], "u1");
        assert_eq!(v["email"], "ada@example.com");
    }

    #[test]
    fn user_record_omits_missing_optionals() {
        let user = UserRecord::from_fields("u2", Map::new());
        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v, json!({"uid": "u2"}));
    }

    #[test]
    fn user_record_document_id_wins_over_uid_field() {
        let Value::Object(map) = json!({"uid": "stale"}) else {
            unreachable!()
        };
        let user = UserRecord::from_fields("fresh", map);
        assert_eq!(user.uid, "fresh");
        assert!(user.extra.is_empty());
    }

    #[test]
    fn non_string_name_stays_in_extra() {
        let Value::Object(map) = json!({"name": 42}) else {
            unreachable!()
        };
        let user = UserRecord::from_fields("u3", map);
        assert!(user.name.is_none());
        assert_eq!(user.extra["name"], 42);
    }

    #[test]
    fn update_fields_skip_empty() {
        let update = UserUpdate {
            name: Some(String::new()),
            role: Some("editor".into()),
        };
        let fields = update.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["role"], "editor");
    }

    #[test]
    fn update_with_nothing_is_empty() {
        assert!(UserUpdate::default().is_empty());
        let update: UserUpdate = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(update.is_empty());
    }
}
