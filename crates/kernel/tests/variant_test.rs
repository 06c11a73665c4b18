#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Variant set integration tests.

mod common;

use common::{STORE_PATH, TestApp, image_size};
use depot_kernel::DepotError;

#[tokio::test]
async fn test_set_has_standard_and_double_sizes() {
    let app = TestApp::new();
    let file = app.store_jpeg("photo.jpg", 400, 300).await;

    let set = app
        .state
        .variants()
        .resize_to_set(Some(&file), 100, 75)
        .await
        .unwrap()
        .expect("set for an image");

    assert_eq!(set.raw, file.path);
    assert!(set.x1.starts_with(&format!("/{STORE_PATH}/100x75/")));
    assert!(set.x2.starts_with(&format!("/{STORE_PATH}/200x150/")));
    assert_eq!(image_size(&app.disk_path(&set.x1)), (100, 75));
    assert_eq!(image_size(&app.disk_path(&set.x2)), (200, 150));
}

#[tokio::test]
async fn test_set_matches_direct_resizes() {
    let app = TestApp::new();
    let file = app.store_png("logo.png", 64, 64).await;
    let cache = app.state.resize_cache();

    let set = app
        .state
        .variants()
        .resize_to_set(Some(&file), 16, 16)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(set.x1, cache.resized_image_path(&file, 16, 16).await.unwrap());
    assert_eq!(set.x2, cache.resized_image_path(&file, 32, 32).await.unwrap());
    // Both direct calls were cache hits.
    assert_eq!(app.backend.resizes(), 2);
}

#[tokio::test]
async fn test_absent_image_yields_nothing() {
    let app = TestApp::new();
    let variants = app.state.variants();

    assert!(variants.resize_to_set(None, 10, 10).await.unwrap().is_none());
    assert!(variants.resize_to_retina_set(None).await.unwrap().is_none());
    assert_eq!(app.stored_file_count(), 0);
    assert!(!app.public_dir().join(STORE_PATH).exists());
}

#[tokio::test]
async fn test_set_with_oversize_double_rejected() {
    let app = TestApp::with_config(|config| config.max_image_dimension = 100);
    let file = app.store_jpeg("photo.jpg", 20, 20).await;

    let err = app
        .state
        .variants()
        .resize_to_set(Some(&file), 60, 60)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DepotError::InvalidDimensions {
            width: 120,
            height: 120
        }
    ));
}

#[tokio::test]
async fn test_retina_set_halves_the_master() {
    let app = TestApp::new();
    let file = app.store_jpeg("hero.jpg", 200, 100).await;

    let set = app
        .state
        .variants()
        .resize_to_retina_set(Some(&file))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(set.raw, file.path);
    assert_eq!(set.x2, file.path);
    assert!(set.x1.starts_with(&format!("/{STORE_PATH}/100x50/")));
    assert_eq!(image_size(&app.disk_path(&set.x1)), (100, 50));
    assert_eq!(app.backend.probes(), 1);
}

#[tokio::test]
async fn test_retina_set_rounds_odd_sizes_down() {
    let app = TestApp::new();
    let file = app.store_png("odd.png", 101, 1).await;

    let set = app
        .state
        .variants()
        .resize_to_retina_set(Some(&file))
        .await
        .unwrap()
        .unwrap();

    assert!(set.x1.starts_with(&format!("/{STORE_PATH}/50x1/")));
}

#[tokio::test]
async fn test_retina_set_of_undecodable_file() {
    let app = TestApp::new();
    let file = app.store("notes.txt", "text/plain", b"text".to_vec()).await;

    let set = app
        .state
        .variants()
        .resize_to_retina_set(Some(&file))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(set.raw, file.path);
    assert_eq!(set.x1, file.path);
    assert_eq!(set.x2, file.path);
    assert_eq!(app.backend.resizes(), 0);
}

#[tokio::test]
async fn test_set_serializes_with_density_keys() {
    let app = TestApp::new();
    let file = app.store_jpeg("photo.jpg", 40, 40).await;

    let set = app
        .state
        .variants()
        .resize_to_set(Some(&file), 10, 10)
        .await
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&set).unwrap();

    assert_eq!(json["raw"], file.path.as_str());
    assert_eq!(json["1x"], set.x1.as_str());
    assert_eq!(json["2x"], set.x2.as_str());
}

#[tokio::test]
async fn test_retina_set_of_oversize_master_serves_original() {
    let app = TestApp::with_config(|config| config.max_image_dimension = 40);
    let file = app.store_png("poster.png", 100, 60).await;

    let set = app
        .state
        .variants()
        .resize_to_retina_set(Some(&file))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(set.x1, file.path);
    assert_eq!(set.x2, file.path);
    assert_eq!(app.backend.resizes(), 0);
}
