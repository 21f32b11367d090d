//! Composer and JSON store working together: attach, submit, reload.

use image::{DynamicImage, ImageFormat, RgbImage};
use postbox::composer::{AttachOutcome, Composer, Identity, SubmitError};
use postbox::imaging::{ClipboardItem, NormalizeSettings, RawImage, RustBackend, data_uri};
use postbox::posts::{JsonFileStore, PostStore};
use std::io::Cursor;
use tempfile::TempDir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([10, 120, 240]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn composer() -> Composer<RustBackend> {
    Composer::new(RustBackend::new(), NormalizeSettings::default(), 280)
}

#[tokio::test]
async fn attached_image_is_stored_as_bounded_jpeg() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("posts.json");
    let store = JsonFileStore::open(&path).unwrap();
    let composer = composer();
    let ada = Identity::new("ada@example.com");

    let outcome = composer
        .attach(RawImage::new(png_bytes(1600, 1200), "image/png").with_name("beach.png"))
        .await
        .unwrap();
    assert!(matches!(outcome, AttachOutcome::Committed(_)));

    let post = composer.submit("At the beach", Some(&ada), &store).unwrap();
    assert!(composer.state().is_empty());

    let reopened = JsonFileStore::open(&path).unwrap();
    let stored = reopened.get(&post.id).unwrap();
    assert_eq!(stored.content, "At the beach");

    let (mime, bytes) = data_uri::decode(stored.image_url.as_deref().unwrap()).unwrap();
    assert_eq!(mime, "image/jpeg");
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (800, 600));
}

#[tokio::test]
async fn paste_while_processing_keeps_the_paste() {
    let composer = composer();
    let tmp = TempDir::new().unwrap();
    let store = JsonFileStore::open(tmp.path().join("posts.json")).unwrap();

    let pasted = vec![
        ClipboardItem::new("text/html", b"<b>hi</b>".to_vec()),
        ClipboardItem::new("image/png", png_bytes(300, 1000)),
    ];
    let (picked, pasted) = tokio::join!(
        composer.attach(RawImage::new(png_bytes(1600, 1200), "image/png")),
        composer.paste(pasted),
    );
    assert_eq!(picked.unwrap(), AttachOutcome::Superseded);
    assert!(matches!(pasted.unwrap(), Some(AttachOutcome::Committed(_))));

    let post = composer
        .submit("", Some(&Identity::new("bob@example.com")), &store)
        .unwrap();
    let (_, bytes) = data_uri::decode(post.image_url.as_deref().unwrap()).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (180, 600));
}

#[test]
fn signed_out_submit_is_refused() {
    let tmp = TempDir::new().unwrap();
    let store = JsonFileStore::open(tmp.path().join("posts.json")).unwrap();

    let err = composer().submit("hello", None, &store).unwrap_err();
    assert!(matches!(err, SubmitError::NotAuthenticated));
    assert!(store.list(None).unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn list_filters_by_author_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("posts.json");
    {
        let store = JsonFileStore::open(&path).unwrap();
        let composer = composer();
        for (email, text) in [
            ("ada@example.com", "one"),
            ("bob@example.com", "two"),
            ("ada@example.com", "three"),
        ] {
            composer
                .submit(text, Some(&Identity::new(email)), &store)
                .unwrap();
        }
    }

    let store = JsonFileStore::open(&path).unwrap();
    let ada: Vec<String> = store
        .list(Some("ada@example.com"))
        .unwrap()
        .into_iter()
        .map(|p| p.content)
        .collect();
    assert_eq!(ada, vec!["one", "three"]);
}
