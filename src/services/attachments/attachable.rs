use crate::api::error::AppError;
use crate::entities::{fileables, files, posts, products, users};
use sea_orm::{ConnectionTrait, TransactionTrait};
use std::collections::BTreeSet;

use super::{AttachableKind, AttachableRef, AttachmentLedger};

/// Capability of a domain record that can hold files under roles.
pub trait Attachable {
    const KIND: AttachableKind;

    fn attachable_id(&self) -> i32;

    fn attachable(&self) -> AttachableRef {
        AttachableRef::new(Self::KIND, self.attachable_id())
    }

    /// Ledger operations scoped to this record.
    fn files<'c, C: ConnectionTrait>(&self, db: &'c C) -> HasFiles<'c, C> {
        HasFiles::new(db, self.attachable())
    }
}

impl Attachable for posts::Model {
    const KIND: AttachableKind = AttachableKind::Post;

    fn attachable_id(&self) -> i32 {
        self.id
    }
}

impl Attachable for products::Model {
    const KIND: AttachableKind = AttachableKind::Product;

    fn attachable_id(&self) -> i32 {
        self.id
    }
}

impl Attachable for users::Model {
    const KIND: AttachableKind = AttachableKind::User;

    fn attachable_id(&self) -> i32 {
        self.id
    }
}

/// The attachment ledger bound to one `(kind, id)`.
pub struct HasFiles<'c, C> {
    db: &'c C,
    target: AttachableRef,
}

impl<'c, C: ConnectionTrait> HasFiles<'c, C> {
    pub fn new(db: &'c C, target: AttachableRef) -> Self {
        Self { db, target }
    }

    /// Every attached file with its ledger row.
    pub async fn all(&self) -> Result<Vec<(fileables::Model, files::Model)>, AppError> {
        AttachmentLedger::entries(self.db, self.target, None).await
    }

    pub async fn with_role(
        &self,
        role: &str,
    ) -> Result<Vec<(fileables::Model, files::Model)>, AppError> {
        AttachmentLedger::entries(self.db, self.target, Some(role)).await
    }

    pub async fn by_role(&self, role: &str) -> Result<Vec<files::Model>, AppError> {
        AttachmentLedger::files_for_role(self.db, self.target, role).await
    }

    pub async fn first_by_role(&self, role: &str) -> Result<Option<files::Model>, AppError> {
        AttachmentLedger::first_file_for_role(self.db, self.target, role).await
    }

    pub async fn attach(
        &self,
        file: &files::Model,
        role: &str,
    ) -> Result<fileables::Model, AppError> {
        AttachmentLedger::attach(self.db, self.target, file.id, role).await
    }

    pub async fn detach(&self, file: &files::Model, role: &str) -> Result<bool, AppError> {
        AttachmentLedger::detach(self.db, self.target, file.id, Some(role)).await
    }

    pub async fn detach_all(&self, role: Option<&str>) -> Result<bool, AppError> {
        AttachmentLedger::detach_all(self.db, self.target, role).await
    }

    pub async fn has(&self, file: &files::Model, role: Option<&str>) -> Result<bool, AppError> {
        AttachmentLedger::has_file(self.db, self.target, file.id, role).await
    }

    pub async fn has_any(&self) -> Result<bool, AppError> {
        Ok(AttachmentLedger::count(self.db, self.target, None).await? > 0)
    }

    pub async fn roles(&self) -> Result<BTreeSet<String>, AppError> {
        AttachmentLedger::roles_in_use(self.db, self.target).await
    }
}

impl<'c, C: ConnectionTrait + TransactionTrait> HasFiles<'c, C> {
    pub async fn sync(&self, file_ids: &[i32], role: &str) -> Result<(), AppError> {
        AttachmentLedger::sync(self.db, self.target, file_ids, role).await
    }
}

pub mod roles {
    pub const AVATAR: &str = "avatar";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const GALLERY: &str = "gallery";
    pub const ATTACHMENT: &str = "attachment";
    pub const BANNER: &str = "banner";
}

impl posts::Model {
    pub async fn thumbnail(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Option<files::Model>, AppError> {
        self.files(db).first_by_role(roles::THUMBNAIL).await
    }

    pub async fn gallery(&self, db: &impl ConnectionTrait) -> Result<Vec<files::Model>, AppError> {
        self.files(db).by_role(roles::GALLERY).await
    }

    pub async fn attachments(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Vec<files::Model>, AppError> {
        self.files(db).by_role(roles::ATTACHMENT).await
    }

    pub async fn banner(&self, db: &impl ConnectionTrait) -> Result<Option<files::Model>, AppError> {
        self.files(db).first_by_role(roles::BANNER).await
    }

    pub async fn has_media(&self, db: &impl ConnectionTrait) -> Result<bool, AppError> {
        self.files(db).has_any().await
    }
}

impl products::Model {
    pub async fn thumbnail(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Option<files::Model>, AppError> {
        self.files(db).first_by_role(roles::THUMBNAIL).await
    }

    pub async fn gallery(&self, db: &impl ConnectionTrait) -> Result<Vec<files::Model>, AppError> {
        self.files(db).by_role(roles::GALLERY).await
    }

    pub async fn attachments(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Vec<files::Model>, AppError> {
        self.files(db).by_role(roles::ATTACHMENT).await
    }

    pub async fn has_images(&self, db: &impl ConnectionTrait) -> Result<bool, AppError> {
        let files = self.files(db);
        Ok(files.first_by_role(roles::THUMBNAIL).await?.is_some()
            || files.first_by_role(roles::GALLERY).await?.is_some())
    }
}

impl users::Model {
    pub async fn avatar(&self, db: &impl ConnectionTrait) -> Result<Option<files::Model>, AppError> {
        self.files(db).first_by_role(roles::AVATAR).await
    }

    pub async fn banner(&self, db: &impl ConnectionTrait) -> Result<Option<files::Model>, AppError> {
        self.files(db).first_by_role(roles::BANNER).await
    }
}
