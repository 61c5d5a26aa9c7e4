use crate::model::media::MediaState;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: PeerId,
    pub name: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: PeerId,
    pub name: String,
    #[serde(flatten)]
    pub media: MediaState,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_creator: bool,
}

impl Participant {
    pub fn new(profile: &UserProfile, media: MediaState) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            media,
            is_admin: false,
            is_creator: false,
        }
    }
}
