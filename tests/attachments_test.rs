mod common;

use common::*;
use file_shelf::api::error::AppError;
use file_shelf::services::attachments::{
    Attachable, AttachableKind, AttachableRef, AttachmentLedger, roles,
};
use file_shelf::services::file_service::UploadedFile;
use std::collections::BTreeSet;

#[tokio::test]
async fn test_attach_detach_round_trip() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let post = seed_post(&db, "Post").await;
    let file = seed_file(&db, &storage, "a.jpg", "image/jpeg", 10).await;

    let files = post.files(&db);
    assert!(!files.has(&file, None).await.unwrap());

    let row = files.attach(&file, roles::GALLERY).await.unwrap();
    assert_eq!(row.fileable_type, "post");
    assert_eq!(row.fileable_id, post.id);
    assert_eq!(row.entity_kind(), Some("Post"));
    assert!(files.has(&file, Some(roles::GALLERY)).await.unwrap());
    assert!(!files.has(&file, Some(roles::THUMBNAIL)).await.unwrap());

    assert!(files.detach(&file, roles::GALLERY).await.unwrap());
    assert!(!files.has(&file, None).await.unwrap());

    // Detaching twice reports nothing removed
    assert!(!files.detach(&file, roles::GALLERY).await.unwrap());
}

#[tokio::test]
async fn test_attach_duplicate_is_conflict_and_unknown_file_is_not_found() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let product = seed_product(&db, "Chair").await;
    let file = seed_file(&db, &storage, "chair.png", "image/png", 10).await;

    product.files(&db).attach(&file, roles::THUMBNAIL).await.unwrap();
    let err = product
        .files(&db)
        .attach(&file, roles::THUMBNAIL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(
        AttachmentLedger::count(&db, product.attachable(), None)
            .await
            .unwrap(),
        1
    );

    let err = AttachmentLedger::attach(&db, product.attachable(), 9999, roles::GALLERY)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_kinds_with_same_id_are_isolated() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let post = seed_post(&db, "Post").await;
    let user = seed_user(&db, "sam", "member").await;
    assert_eq!(post.id, user.id);

    let file = seed_file(&db, &storage, "x.png", "image/png", 10).await;
    post.files(&db).attach(&file, roles::BANNER).await.unwrap();

    assert!(post.banner(&db).await.unwrap().is_some());
    assert!(user.banner(&db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_one_file_shared_across_entities_and_roles() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let post = seed_post(&db, "Post").await;
    let product = seed_product(&db, "Desk").await;
    let logo = seed_file(&db, &storage, "logo.svg", "image/svg+xml", 10).await;

    post.files(&db).attach(&logo, roles::THUMBNAIL).await.unwrap();
    post.files(&db).attach(&logo, roles::GALLERY).await.unwrap();
    product.files(&db).attach(&logo, roles::THUMBNAIL).await.unwrap();

    let entries = post.files(&db).all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|(_, f)| f.id == logo.id));

    let gallery = post.files(&db).with_role(roles::GALLERY).await.unwrap();
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery[0].0.role, roles::GALLERY);
    assert_eq!(gallery[0].1.id, logo.id);

    assert_eq!(
        post.files(&db).roles().await.unwrap(),
        BTreeSet::from([roles::GALLERY.to_string(), roles::THUMBNAIL.to_string()])
    );

    // Removing every role from the post leaves the product untouched
    assert!(
        AttachmentLedger::detach(&db, post.attachable(), logo.id, None)
            .await
            .unwrap()
    );
    assert!(!post.has_media(&db).await.unwrap());
    assert_eq!(product.thumbnail(&db).await.unwrap().unwrap().id, logo.id);
}

#[tokio::test]
async fn test_role_lists_keep_attachment_order() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let product = seed_product(&db, "Sofa").await;
    let a = seed_file(&db, &storage, "a.jpg", "image/jpeg", 10).await;
    let b = seed_file(&db, &storage, "b.jpg", "image/jpeg", 10).await;
    let c = seed_file(&db, &storage, "c.jpg", "image/jpeg", 10).await;

    assert!(!product.has_images(&db).await.unwrap());

    for file in [&c, &a, &b] {
        product.files(&db).attach(file, roles::GALLERY).await.unwrap();
    }

    let gallery: Vec<i32> = product
        .gallery(&db)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(gallery, vec![c.id, a.id, b.id]);
    assert_eq!(
        product
            .files(&db)
            .first_by_role(roles::GALLERY)
            .await
            .unwrap()
            .unwrap()
            .id,
        c.id
    );
    assert!(product.has_images(&db).await.unwrap());
    assert!(product.thumbnail(&db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sync_replaces_role_set() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let post = seed_post(&db, "Post").await;
    let a = seed_file(&db, &storage, "a.pdf", "application/pdf", 10).await;
    let b = seed_file(&db, &storage, "b.pdf", "application/pdf", 10).await;
    let c = seed_file(&db, &storage, "c.pdf", "application/pdf", 10).await;
    let cover = seed_file(&db, &storage, "cover.png", "image/png", 10).await;

    post.files(&db).attach(&a, roles::ATTACHMENT).await.unwrap();
    post.files(&db).attach(&b, roles::ATTACHMENT).await.unwrap();
    post.files(&db).attach(&cover, roles::THUMBNAIL).await.unwrap();

    post.files(&db)
        .sync(&[c.id, b.id, c.id], roles::ATTACHMENT)
        .await
        .unwrap();

    let ids: Vec<i32> = post
        .attachments(&db)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id]);
    assert_eq!(post.thumbnail(&db).await.unwrap().unwrap().id, cover.id);

    // Empty sync clears only that role
    post.files(&db).sync(&[], roles::ATTACHMENT).await.unwrap();
    assert!(post.attachments(&db).await.unwrap().is_empty());
    assert!(post.has_media(&db).await.unwrap());
}

#[tokio::test]
async fn test_sync_with_unknown_file_rolls_back() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let user = seed_user(&db, "lee", "member").await;
    let old = seed_file(&db, &storage, "old.png", "image/png", 10).await;
    let new = seed_file(&db, &storage, "new.png", "image/png", 10).await;
    user.files(&db).attach(&old, roles::AVATAR).await.unwrap();

    let err = user
        .files(&db)
        .sync(&[new.id, 4040], roles::AVATAR)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(user.avatar(&db).await.unwrap().unwrap().id, old.id);
    assert_eq!(
        AttachmentLedger::count(&db, user.attachable(), Some(roles::AVATAR))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_detach_all_by_role_and_everything() {
    let db = setup_test_db().await;
    let storage = MockStorageService::default();
    let target = AttachableRef::new(AttachableKind::Product, seed_product(&db, "Bed").await.id);
    let a = seed_file(&db, &storage, "a.png", "image/png", 10).await;
    let b = seed_file(&db, &storage, "b.png", "image/png", 10).await;

    AttachmentLedger::attach(&db, target, a.id, roles::GALLERY).await.unwrap();
    AttachmentLedger::attach(&db, target, b.id, roles::GALLERY).await.unwrap();
    AttachmentLedger::attach(&db, target, a.id, roles::THUMBNAIL).await.unwrap();

    assert!(
        AttachmentLedger::detach_all(&db, target, Some(roles::GALLERY))
            .await
            .unwrap()
    );
    assert_eq!(AttachmentLedger::count(&db, target, None).await.unwrap(), 1);

    assert!(AttachmentLedger::detach_all(&db, target, None).await.unwrap());
    assert!(!AttachmentLedger::detach_all(&db, target, None).await.unwrap());
    assert!(
        AttachmentLedger::roles_in_use(&db, target)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_deleting_file_removes_it_from_every_entity() {
    let t = setup_app().await;
    let post = seed_post(&t.db, "Post").await;
    let product = seed_product(&t.db, "Shelf").await;

    let service = t.file_service();
    let file = service
        .upload(UploadedFile::new(
            "manual.pdf",
            Some("application/pdf".to_string()),
            bytes::Bytes::from_static(b"%PDF-1.4 manual"),
        ))
        .await
        .unwrap();
    assert!(t.storage.contains(&file.path));

    post.files(&t.db).attach(&file, roles::ATTACHMENT).await.unwrap();
    product.files(&t.db).attach(&file, roles::ATTACHMENT).await.unwrap();

    let deleted = service.delete(file.id).await.unwrap();
    assert_eq!(deleted.id, file.id);

    assert!(post.attachments(&t.db).await.unwrap().is_empty());
    assert!(product.attachments(&t.db).await.unwrap().is_empty());
    assert!(!t.storage.contains(&file.path));

    let err = service.delete(file.id).await.unwrap_err();
    assert!(err.is_not_found());
}
