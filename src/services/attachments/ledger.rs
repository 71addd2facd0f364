use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::file_registry::FileRegistry;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::collections::BTreeSet;

use super::AttachableRef;

pub const ALREADY_ATTACHED: &str = "This file is already attached with the same role.";

/// Shared operations over the polymorphic `fileables` table. Every call is
/// scoped to one attachable instance.
///
/// The unique index on `(file_id, fileable_type, fileable_id, role)` is the
/// only arbiter between concurrent writers: two racing `attach` calls for the
/// same triple resolve to one row and one `Conflict`. `sync` and `detach`
/// take no locks, so concurrent syncs on one `(entity, role)` are
/// last-write-wins.
pub struct AttachmentLedger;

impl AttachmentLedger {
    fn scope(target: AttachableRef) -> Condition {
        Condition::all()
            .add(fileables::Column::FileableType.eq(target.kind.tag()))
            .add(fileables::Column::FileableId.eq(target.id))
    }

    fn scope_with_role(target: AttachableRef, role: Option<&str>) -> Condition {
        let cond = Self::scope(target);
        match role {
            Some(role) => cond.add(fileables::Column::Role.eq(role)),
            None => cond,
        }
    }

    fn translate_insert_error(err: DbErr) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(ALREADY_ATTACHED.to_string())
            }
            _ => AppError::Database(err),
        }
    }

    async fn insert_row(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        file_id: i32,
        role: &str,
    ) -> Result<fileables::Model, AppError> {
        let now = Utc::now();
        let row = fileables::ActiveModel {
            file_id: Set(file_id),
            fileable_type: Set(target.kind.tag().to_string()),
            fileable_id: Set(target.id),
            role: Set(role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        row.insert(db).await.map_err(Self::translate_insert_error)
    }

    /// Files attached to `target` under `role`, in attachment order.
    pub async fn files_for_role(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        role: &str,
    ) -> Result<Vec<files::Model>, AppError> {
        Ok(Files::find()
            .inner_join(Fileables)
            .filter(Self::scope_with_role(target, Some(role)))
            .order_by_asc(fileables::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn first_file_for_role(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        role: &str,
    ) -> Result<Option<files::Model>, AppError> {
        Ok(Files::find()
            .inner_join(Fileables)
            .filter(Self::scope_with_role(target, Some(role)))
            .order_by_asc(fileables::Column::Id)
            .one(db)
            .await?)
    }

    /// Ledger rows for `target` paired with their file, optionally narrowed
    /// to one role. A file held under two roles appears twice.
    pub async fn entries(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        role: Option<&str>,
    ) -> Result<Vec<(fileables::Model, files::Model)>, AppError> {
        let rows = Fileables::find()
            .filter(Self::scope_with_role(target, role))
            .find_also_related(Files)
            .order_by_asc(fileables::Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(pivot, file)| file.map(|file| (pivot, file)))
            .collect())
    }

    /// Fails with `Conflict` when the triple is already present; the existing
    /// row is left untouched.
    pub async fn attach(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        file_id: i32,
        role: &str,
    ) -> Result<fileables::Model, AppError> {
        if !FileRegistry::exists(db, file_id).await? {
            return Err(AppError::NotFound(format!("File {} not found", file_id)));
        }

        let row = Self::insert_row(db, target, file_id, role).await?;
        tracing::debug!("Attached file {} to {} as '{}'", file_id, target, role);
        Ok(row)
    }

    /// Removes the file from `target` under `role`, or under every role when
    /// `role` is `None`. Returns whether anything was removed.
    pub async fn detach(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        file_id: i32,
        role: Option<&str>,
    ) -> Result<bool, AppError> {
        let res = Fileables::delete_many()
            .filter(Self::scope_with_role(target, role))
            .filter(fileables::Column::FileId.eq(file_id))
            .exec(db)
            .await?;

        tracing::debug!(
            "Detached file {} from {} ({} rows)",
            file_id,
            target,
            res.rows_affected
        );
        Ok(res.rows_affected > 0)
    }

    pub async fn detach_all(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        role: Option<&str>,
    ) -> Result<bool, AppError> {
        let res = Fileables::delete_many()
            .filter(Self::scope_with_role(target, role))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn has_file(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        file_id: i32,
        role: Option<&str>,
    ) -> Result<bool, AppError> {
        let count = Fileables::find()
            .filter(Self::scope_with_role(target, role))
            .filter(fileables::Column::FileId.eq(file_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Replaces the set of files held by `target` under `role`. Runs in one
    /// transaction: an unknown file id rolls back the whole sync. Repeated ids
    /// collapse to their first occurrence.
    pub async fn sync<C>(
        db: &C,
        target: AttachableRef,
        file_ids: &[i32],
        role: &str,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let mut wanted: Vec<i32> = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            if !wanted.contains(id) {
                wanted.push(*id);
            }
        }

        let txn = db.begin().await?;

        let removed = Fileables::delete_many()
            .filter(Self::scope_with_role(target, Some(role)))
            .exec(&txn)
            .await?
            .rows_affected;

        if !wanted.is_empty() {
            let live: Vec<i32> = Files::find()
                .select_only()
                .column(files::Column::Id)
                .filter(files::Column::Id.is_in(wanted.clone()))
                .into_tuple()
                .all(&txn)
                .await?;

            if let Some(missing) = wanted.iter().find(|id| !live.contains(id)) {
                return Err(AppError::NotFound(format!("File {} not found", missing)));
            }
        }

        for file_id in &wanted {
            Self::insert_row(&txn, target, *file_id, role).await?;
        }

        txn.commit().await?;

        tracing::info!(
            "Synced '{}' on {}: removed {}, attached {}",
            role,
            target,
            removed,
            wanted.len()
        );
        Ok(())
    }

    pub async fn roles_in_use(
        db: &impl ConnectionTrait,
        target: AttachableRef,
    ) -> Result<BTreeSet<String>, AppError> {
        let roles: Vec<String> = Fileables::find()
            .select_only()
            .column(fileables::Column::Role)
            .distinct()
            .filter(Self::scope(target))
            .into_tuple()
            .all(db)
            .await?;

        Ok(roles.into_iter().collect())
    }

    pub async fn count(
        db: &impl ConnectionTrait,
        target: AttachableRef,
        role: Option<&str>,
    ) -> Result<u64, AppError> {
        Ok(Fileables::find()
            .filter(Self::scope_with_role(target, role))
            .count(db)
            .await?)
    }
}
