pub mod profile;
pub mod response;
pub mod update;

pub use profile::{Location, NotificationSettings, PrivacySettings, UserProfile};
pub use response::ApiResponse;
pub use update::{
    LocationUpdate, NotificationSettingsUpdate, PrivacySettingsUpdate, ProfileUpdate,
};
