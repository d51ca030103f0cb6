use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical client-side profile.
///
/// Deserialization always goes through `WireProfile`, so a profile decoded
/// from any backend payload has every optional field filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireProfile")]
pub struct UserProfile {
    pub id: String,
    pub google_id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    // Backend spelling.
    #[serde(rename = "intrestedIn")]
    pub interested_in: Vec<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub friends: Vec<String>,
    pub friend_requests: Vec<String>,
    /// Roll records are passed through as the backend sends them.
    pub daily_rolls: Vec<Value>,
    pub location: Location,
    pub privacy_settings: PrivacySettings,
    pub notification_settings: NotificationSettings,
    pub is_premium: bool,
    pub is_verified: bool,
    pub is_banned: bool,
    pub is_admin: bool,
    pub has_completed_onboarding: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
    /// `[longitude, latitude]`, as stored by the backend.
    pub coordinates: [f64; 2],
}

impl Default for Location {
    fn default() -> Self {
        Self {
            city: String::new(),
            country: String::new(),
            coordinates: [0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub show_age: bool,
    pub show_location: bool,
    pub show_online_status: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_age: true,
            show_location: true,
            show_online_status: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub friend_requests: bool,
    pub messages: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            friend_requests: true,
            messages: true,
        }
    }
}

/// Profile as the backend sends it. Every field is read loosely: a missing,
/// `null` or mistyped value falls back to its default instead of rejecting the
/// whole profile.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProfile {
    id: Option<Value>,
    #[serde(rename = "_id")]
    document_id: Option<Value>,
    google_id: Option<Value>,
    username: Option<Value>,
    display_name: Option<Value>,
    first_name: Option<Value>,
    last_name: Option<Value>,
    profile_picture: Option<Value>,
    bio: Option<Value>,
    age: Option<Value>,
    gender: Option<Value>,
    #[serde(rename = "intrestedIn")]
    interested_in: Option<Value>,
    last_seen: Option<Value>,
    friends: Option<Value>,
    friend_requests: Option<Value>,
    daily_rolls: Option<Value>,
    location: Option<Value>,
    privacy_settings: Option<Value>,
    notification_settings: Option<Value>,
    is_premium: Option<Value>,
    is_verified: Option<Value>,
    is_banned: Option<Value>,
    is_admin: Option<Value>,
    has_completed_onboarding: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

impl From<WireProfile> for UserProfile {
    fn from(wire: WireProfile) -> Self {
        Self {
            id: wire
                .id
                .as_ref()
                .or(wire.document_id.as_ref())
                .and_then(id_string)
                .unwrap_or_default(),
            google_id: text(wire.google_id.as_ref()),
            username: text(wire.username.as_ref()),
            display_name: text(wire.display_name.as_ref()),
            first_name: text(wire.first_name.as_ref()),
            last_name: text(wire.last_name.as_ref()),
            profile_picture: text(wire.profile_picture.as_ref()),
            bio: text(wire.bio.as_ref()),
            age: wire
                .age
                .as_ref()
                .and_then(Value::as_u64)
                .and_then(|age| u32::try_from(age).ok()),
            gender: text(wire.gender.as_ref()),
            interested_in: string_list(wire.interested_in),
            last_seen: timestamp(wire.last_seen.as_ref()),
            friends: id_list(wire.friends),
            friend_requests: id_list(wire.friend_requests),
            daily_rolls: match wire.daily_rolls {
                Some(Value::Array(rolls)) => rolls,
                _ => Vec::new(),
            },
            location: location(wire.location.as_ref()),
            privacy_settings: privacy_settings(wire.privacy_settings.as_ref()),
            notification_settings: notification_settings(wire.notification_settings.as_ref()),
            is_premium: flag(wire.is_premium.as_ref()),
            is_verified: flag(wire.is_verified.as_ref()),
            is_banned: flag(wire.is_banned.as_ref()),
            is_admin: flag(wire.is_admin.as_ref()),
            has_completed_onboarding: matches!(
                wire.has_completed_onboarding,
                Some(Value::Bool(true))
            ),
            created_at: timestamp(wire.created_at.as_ref()),
            updated_at: timestamp(wire.updated_at.as_ref()),
        }
    }
}

impl UserProfile {
    /// Normalize a raw backend user object.
    pub fn from_backend(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn location(value: Option<&Value>) -> Location {
    let defaults = Location::default();
    let Some(Value::Object(fields)) = value else {
        return defaults;
    };
    let coordinates = match fields
        .get("coordinates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
    {
        Some([lng, lat, ..]) => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => [lng, lat],
            _ => defaults.coordinates,
        },
        _ => defaults.coordinates,
    };
    Location {
        city: text(fields.get("city")).unwrap_or(defaults.city),
        country: text(fields.get("country")).unwrap_or(defaults.country),
        coordinates,
    }
}

fn privacy_settings(value: Option<&Value>) -> PrivacySettings {
    let defaults = PrivacySettings::default();
    let Some(Value::Object(fields)) = value else {
        return defaults;
    };
    PrivacySettings {
        show_age: setting(fields.get("showAge"), defaults.show_age),
        show_location: setting(fields.get("showLocation"), defaults.show_location),
        show_online_status: setting(fields.get("showOnlineStatus"), defaults.show_online_status),
    }
}

fn notification_settings(value: Option<&Value>) -> NotificationSettings {
    let defaults = NotificationSettings::default();
    let Some(Value::Object(fields)) = value else {
        return defaults;
    };
    NotificationSettings {
        email: setting(fields.get("email"), defaults.email),
        push: setting(fields.get("push"), defaults.push),
        friend_requests: setting(fields.get("friendRequests"), defaults.friend_requests),
        messages: setting(fields.get("messages"), defaults.messages),
    }
}

/// Ids arrive as strings, numbers, or populated documents carrying `_id`/`id`.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("_id").or_else(|| map.get("id")).and_then(id_string),
        _ => None,
    }
}

fn id_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values.iter().filter_map(id_string).collect(),
        _ => Vec::new(),
    }
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn setting(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

fn flag(value: Option<&Value>) -> bool {
    setting(value, false)
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}
