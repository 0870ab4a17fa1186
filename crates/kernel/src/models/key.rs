//! Websafe entity keys.
//!
//! A key is the path from the root profile down to an entity, for example
//! `Profile:alice/Conference:7/Session:12`. Its websafe form is the path with
//! each id percent-encoded, then base64url encoded without padding.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

/// Kinds of keyed entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Profile,
    Conference,
    Session,
    Speaker,
}

impl EntityKind {
    fn as_str(self) -> &'static str {
        match self {
            EntityKind::Profile => "Profile",
            EntityKind::Conference => "Conference",
            EntityKind::Session => "Session",
            EntityKind::Speaker => "Speaker",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Profile" => Some(EntityKind::Profile),
            "Conference" => Some(EntityKind::Conference),
            "Session" => Some(EntityKind::Session),
            "Speaker" => Some(EntityKind::Speaker),
            _ => None,
        }
    }

    /// Lowercase name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Profile => "profile",
            EntityKind::Conference => "conference",
            EntityKind::Session => "session",
            EntityKind::Speaker => "speaker",
        }
    }

    /// Kinds along the path to an entity of this kind.
    fn path_shape(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Profile => &[EntityKind::Profile],
            EntityKind::Conference => &[EntityKind::Profile, EntityKind::Conference],
            EntityKind::Session => &[
                EntityKind::Profile,
                EntityKind::Conference,
                EntityKind::Session,
            ],
            EntityKind::Speaker => &[EntityKind::Profile, EntityKind::Speaker],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A websafe string that does not decode to a key of the expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Bad or corrupt {} websafe key: {key}", .kind.label())]
pub struct KeyError {
    pub kind: EntityKind,
    pub key: String,
}

/// Hierarchical entity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Root profile id (the user id).
    user_id: String,

    /// Numeric ids below the profile, in path order.
    ids: Vec<(EntityKind, i64)>,
}

impl EntityKey {
    pub fn profile(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ids: Vec::new(),
        }
    }

    pub fn conference(organizer_user_id: impl Into<String>, id: i64) -> Self {
        Self {
            user_id: organizer_user_id.into(),
            ids: vec![(EntityKind::Conference, id)],
        }
    }

    pub fn session(organizer_user_id: impl Into<String>, conference_id: i64, id: i64) -> Self {
        Self {
            user_id: organizer_user_id.into(),
            ids: vec![
                (EntityKind::Conference, conference_id),
                (EntityKind::Session, id),
            ],
        }
    }

    pub fn speaker(creator_user_id: impl Into<String>, id: i64) -> Self {
        Self {
            user_id: creator_user_id.into(),
            ids: vec![(EntityKind::Speaker, id)],
        }
    }

    /// Kind of the entity this key addresses.
    pub fn kind(&self) -> EntityKind {
        self.ids
            .last()
            .map(|(kind, _)| *kind)
            .unwrap_or(EntityKind::Profile)
    }

    /// User id of the root profile.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Numeric id of the path element of `kind`, if present.
    pub fn id_of(&self, kind: EntityKind) -> Option<i64> {
        self.ids.iter().find(|(k, _)| *k == kind).map(|(_, id)| *id)
    }

    /// Key of the parent entity.
    pub fn parent(&self) -> Option<EntityKey> {
        if self.ids.is_empty() {
            return None;
        }
        Some(Self {
            user_id: self.user_id.clone(),
            ids: self.ids[..self.ids.len() - 1].to_vec(),
        })
    }

    /// Encode as an opaque URL-safe string.
    pub fn to_websafe(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.path())
    }

    /// Decode a websafe string, requiring a key of `kind`.
    pub fn from_websafe(websafe: &str, kind: EntityKind) -> Result<Self, KeyError> {
        let err = || KeyError {
            kind,
            key: websafe.to_string(),
        };

        let bytes = URL_SAFE_NO_PAD.decode(websafe).map_err(|_| err())?;
        let path = String::from_utf8(bytes).map_err(|_| err())?;

        let mut segments = Vec::new();
        for segment in path.split('/') {
            let (kind_name, raw_id) = segment.split_once(':').ok_or_else(err)?;
            let segment_kind = EntityKind::parse(kind_name).ok_or_else(err)?;
            let id = urlencoding::decode(raw_id).map_err(|_| err())?;
            segments.push((segment_kind, id.into_owned()));
        }

        let shape: Vec<EntityKind> = segments.iter().map(|(k, _)| *k).collect();
        if shape != kind.path_shape() {
            return Err(err());
        }

        let mut segments = segments.into_iter();
        let user_id = segments.next().map(|(_, id)| id).ok_or_else(err)?;
        if user_id.is_empty() {
            return Err(err());
        }

        let mut ids = Vec::new();
        for (segment_kind, raw) in segments {
            let id: i64 = raw.parse().map_err(|_| err())?;
            ids.push((segment_kind, id));
        }

        Ok(Self { user_id, ids })
    }

    fn path(&self) -> String {
        let mut path = format!(
            "{}:{}",
            EntityKind::Profile,
            urlencoding::encode(&self.user_id)
        );
        for (kind, id) in &self.ids {
            path.push_str(&format!("/{kind}:{id}"));
        }
        path
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
