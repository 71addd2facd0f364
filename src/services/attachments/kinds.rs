use crate::entities::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Entity kinds that can hold files. The tag is what the ledger stores in
/// `fileables.fileable_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachableKind {
    Post,
    Product,
    User,
}

impl AttachableKind {
    pub const ALL: [AttachableKind; 3] = [
        AttachableKind::Post,
        AttachableKind::Product,
        AttachableKind::User,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            AttachableKind::Post => "post",
            AttachableKind::Product => "product",
            AttachableKind::User => "user",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AttachableKind::Post => "Post",
            AttachableKind::Product => "Product",
            AttachableKind::User => "User",
        }
    }

    /// Looks the instance up in the table backing this kind.
    pub async fn exists(self, db: &impl ConnectionTrait, id: i32) -> Result<bool, DbErr> {
        let found = match self {
            AttachableKind::Post => Posts::find_by_id(id).one(db).await?.is_some(),
            AttachableKind::Product => Products::find_by_id(id).one(db).await?.is_some(),
            AttachableKind::User => Users::find_by_id(id).one(db).await?.is_some(),
        };
        Ok(found)
    }
}

impl fmt::Display for AttachableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid model type [{}].", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for AttachableKind {
    type Err = UnknownKind;

    /// Accepts the tag in any case, with `_`, `-` or spaces ignored, so
    /// "post", "Post" and "POST" all resolve to the same kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        AttachableKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Identity of one attachable instance: `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachableRef {
    pub kind: AttachableKind,
    pub id: i32,
}

impl AttachableRef {
    pub fn new(kind: AttachableKind, id: i32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for AttachableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("post".parse::<AttachableKind>(), Ok(AttachableKind::Post));
        assert_eq!("Product".parse::<AttachableKind>(), Ok(AttachableKind::Product));
        assert_eq!("USER".parse::<AttachableKind>(), Ok(AttachableKind::User));
    }

    #[test]
    fn test_unknown_kind_message() {
        let err = "migration".parse::<AttachableKind>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid model type [migration].");
        assert!("".parse::<AttachableKind>().is_err());
    }

    #[test]
    fn test_tag_round_trips_through_display() {
        for kind in AttachableKind::ALL {
            assert_eq!(kind.to_string().parse::<AttachableKind>(), Ok(kind));
        }
        assert_eq!(AttachableKind::Post.display_name(), "Post");
    }
}
