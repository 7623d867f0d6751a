//! End-to-end resizing scenarios through the public API.
//!
//! Fixtures mirror a WordPress install with two uploads:
//!
//! - `tachyon.jpg`: 1280x719, served as is
//! - `tachyon-large.jpg`: 5312x2988, downsized by WordPress to the
//!   2560x1440 master `tachyon-large-scaled.jpg`
//!
//! plus an `oversized` 2000x1000 size registered on top of the defaults.

use tachyon::config::{resolve_config, stock_defaults_value};
use tachyon::library::{Attachment, Library};
use tachyon::rewrite::Rewriter;
use tachyon::sizing::{Dimensions, RegisteredSizes, SizeDefinition, SizeRequest};
use tachyon::url::Urls;

const SMALL: u64 = 10;
const LARGE: u64 = 11;

fn library() -> Library {
    Library::new()
        .with(Attachment {
            id: SMALL,
            file: "tachyon.jpg".to_string(),
            original_file: None,
            dimensions: Dimensions::new(1280, 719),
        })
        .with(Attachment {
            id: LARGE,
            file: "tachyon-large-scaled.jpg".to_string(),
            original_file: Some("tachyon-large.jpg".to_string()),
            dimensions: Dimensions::new(2560, 1440),
        })
}

fn rewriter() -> Rewriter<Library, RegisteredSizes> {
    let sizes =
        RegisteredSizes::wordpress_defaults().with("oversized", SizeDefinition::fit(2000, 1000));
    Rewriter::new(
        library(),
        sizes,
        Urls::new("http://example.org/wp-content/uploads", "http://tachy.on/u"),
    )
}

fn first_src(html: &str) -> &str {
    let img = &html[html.find("<img").expect("no <img> in output")..];
    let start = img.find("src=\"").expect("no src in <img>") + 5;
    let end = img[start..].find('"').expect("unterminated src");
    &img[start..start + end]
}

// =========================================================================
// Named sizes
// =========================================================================

#[test]
fn named_sizes_on_small_upload() {
    let cases = [
        ("thumb", "http://tachy.on/u/tachyon.jpg?resize=150,150", (150, 150)),
        ("thumbnail", "http://tachy.on/u/tachyon.jpg?resize=150,150", (150, 150)),
        ("medium", "http://tachy.on/u/tachyon.jpg?fit=300,169", (300, 169)),
        ("medium_large", "http://tachy.on/u/tachyon.jpg?w=768", (768, 431)),
        ("large", "http://tachy.on/u/tachyon.jpg?fit=1024,575", (1024, 575)),
        ("full", "http://tachy.on/u/tachyon.jpg", (1280, 719)),
        ("oversized", "http://tachy.on/u/tachyon.jpg", (1280, 719)),
    ];
    let rewriter = rewriter();
    for (size, url, (width, height)) in cases {
        let src = rewriter.url_for(SMALL, &SizeRequest::named(size)).unwrap();
        assert_eq!(src.url, url, "size {size}");
        assert_eq!((src.width, src.height), (width, height), "size {size}");
    }
}

#[test]
fn named_sizes_on_scaled_master() {
    let cases = [
        ("thumb", "http://tachy.on/u/tachyon-large-scaled.jpg?resize=150,150"),
        ("thumbnail", "http://tachy.on/u/tachyon-large-scaled.jpg?resize=150,150"),
        ("medium", "http://tachy.on/u/tachyon-large-scaled.jpg?fit=300,169"),
        ("medium_large", "http://tachy.on/u/tachyon-large-scaled.jpg?w=768"),
        ("large", "http://tachy.on/u/tachyon-large-scaled.jpg?fit=1024,576"),
        ("full", "http://tachy.on/u/tachyon-large-scaled.jpg"),
        ("oversized", "http://tachy.on/u/tachyon-large-scaled.jpg?fit=1778,1000"),
    ];
    let rewriter = rewriter();
    for (size, url) in cases {
        let src = rewriter.url_for(LARGE, &SizeRequest::named(size)).unwrap();
        assert_eq!(src.url, url, "size {size}");
    }
}

#[test]
fn medium_large_on_scaled_master_delivers_432_high() {
    let src = rewriter()
        .url_for(LARGE, &SizeRequest::named("medium_large"))
        .unwrap();
    assert_eq!((src.width, src.height), (768, 432));
}

#[test]
fn explicit_box_larger_than_upload_is_passthrough() {
    let src = rewriter()
        .url_for(SMALL, &SizeRequest::explicit(2000, 1000, false))
        .unwrap();
    assert_eq!(src.url, "http://tachy.on/u/tachyon.jpg");
}

// =========================================================================
// Content filtering: classic editor
// =========================================================================

fn classic(size: &str, file: &str, width: u32, height: u32) -> String {
    format!(
        r#"<p><img class="alignnone wp-image-{SMALL} size-{size}" src="http://example.org/wp-content/uploads/{file}" alt="" width="{width}" height="{height}" /></p>"#
    )
}

#[test]
fn classic_editor_markup() {
    let cases = [
        (classic("thumb", "tachyon-150x150.jpg", 150, 150), "http://tachy.on/u/tachyon.jpg?resize=150,150"),
        (classic("medium", "tachyon-300x169.jpg", 300, 169), "http://tachy.on/u/tachyon.jpg?fit=300,169"),
        (classic("large", "tachyon-1024x575.jpg", 1024, 575), "http://tachy.on/u/tachyon.jpg?fit=1024,575"),
        (classic("full", "tachyon.jpg", 1280, 719), "http://tachy.on/u/tachyon.jpg"),
        (classic("oversized", "tachyon.jpg", 1280, 719), "http://tachy.on/u/tachyon.jpg"),
    ];
    let rewriter = rewriter();
    for (html, expected) in cases {
        let out = rewriter.rewrite(&html);
        assert_eq!(first_src(&out), expected, "markup: {html}");
    }
}

#[test]
fn classic_editor_markup_keeps_everything_but_src() {
    let html = classic("medium", "tachyon-300x169.jpg", 300, 169);
    let out = rewriter().rewrite(&html);
    let expected = html.replace(
        "http://example.org/wp-content/uploads/tachyon-300x169.jpg",
        "http://tachy.on/u/tachyon.jpg?fit=300,169",
    );
    assert_eq!(out, expected);
}

// =========================================================================
// Content filtering: block editor
// =========================================================================

fn block(size: &str, file: &str) -> String {
    format!(
        r#"<figure class="wp-block-image size-{size}"><img src="http://example.org/wp-content/uploads/{file}" alt="" class="wp-image-{SMALL}"></figure>"#
    )
}

#[test]
fn block_editor_markup() {
    let cases = [
        (block("thumbnail", "tachyon-150x150.jpg"), "http://tachy.on/u/tachyon.jpg?resize=150,150"),
        (block("medium", "tachyon-300x169.jpg"), "http://tachy.on/u/tachyon.jpg?fit=300,169"),
        (block("large", "tachyon-1024x575.jpg"), "http://tachy.on/u/tachyon.jpg?fit=1024,575"),
        (block("full", "tachyon.jpg"), "http://tachy.on/u/tachyon.jpg"),
        (block("oversized", "tachyon.jpg"), "http://tachy.on/u/tachyon.jpg"),
    ];
    let rewriter = rewriter();
    for (html, expected) in cases {
        let out = rewriter.rewrite(&html);
        assert_eq!(first_src(&out), expected, "markup: {html}");
    }
}

#[test]
fn block_editor_scaled_master() {
    let html = format!(
        r#"<figure class="wp-block-image size-large"><img src="http://example.org/wp-content/uploads/tachyon-large-1024x576.jpg" alt="" class="wp-image-{LARGE}"></figure>"#
    );
    let out = rewriter().rewrite(&html);
    assert_eq!(
        first_src(&out),
        "http://tachy.on/u/tachyon-large-scaled.jpg?fit=1024,576"
    );
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn sizes_from_config_drive_rewriting() {
    let overlay: toml::Value = toml::from_str(
        r#"
        cdn_url = "https://cdn.example.com/uploads"
        upload_url = "https://example.org/wp-content/uploads"

        [sizes.thumbnail]
        width = 200
        height = 200
        "#,
    )
    .unwrap();
    let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
    let rewriter = Rewriter::new(library(), config.size_table(), config.urls().unwrap());

    let html = format!(
        r#"<img class="wp-image-{SMALL} size-thumbnail" src="https://example.org/wp-content/uploads/tachyon-200x200.jpg">"#
    );
    assert_eq!(
        first_src(&rewriter.rewrite(&html)),
        "https://cdn.example.com/uploads/tachyon.jpg?resize=200,200"
    );
}
