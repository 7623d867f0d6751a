//! # Tachyon
//!
//! Serves WordPress uploads through a Tachyon-style image CDN. Instead of
//! linking the intermediate files WordPress generates at upload time
//! (`photo-300x169.jpg`), rendered markup is rewritten to request the master
//! image from the CDN with resize parameters (`photo.jpg?fit=300,169`), so
//! any size can be delivered without a file ever existing for it.
//!
//! # Architecture: Resolve → Build → Rewrite
//!
//! ```text
//! 1. Resolve   master dimensions + size request  →  ResizeDirective
//! 2. Build     upload file + ResizeDirective     →  CDN URL
//! 3. Rewrite   rendered HTML                      →  HTML with CDN URLs
//! ```
//!
//! Resolution and URL building are pure functions. The rewriter composes them
//! over markup, asking a [`library::MediaLibrary`] for master dimensions and a
//! [`sizing::SizeTable`] for registered sizes. Both are injected read-only, so
//! tests and hosts can supply snapshots without any process-wide registry.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sizing`] | Size resolution engine: dimensions, size table, rounding, directives |
//! | [`url`] | Upload → CDN mapping and query-string construction |
//! | [`rewrite`] | Content rewriter for `<img>`, `srcset` and image links |
//! | [`library`] | Attachment lookup: JSON manifest and uploads-directory scan |
//! | [`naming`] | WordPress upload filename parser (`-WxH`, `-scaled`) |
//! | [`config`] | `tachyon.toml` loading, merging with stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Upscale
//!
//! A request whose box bounds the master on every constrained axis resolves to
//! the master itself, with no query string. The CDN is never asked to produce
//! pixels that were not uploaded, and the delivered size of every URL is known
//! without fetching it.
//!
//! ## WordPress Rounding
//!
//! Soft-resized boxes use the same rounding as WordPress's
//! `wp_constrain_dimensions`, so a `fit=` URL names exactly the size of the
//! intermediate file it replaces and `width`/`height` attributes in existing
//! markup stay correct.
//!
//! ## Fail Open
//!
//! Markup that cannot be understood is left exactly as it was. An image the
//! rewriter skips still renders from the uploads directory; an image it
//! rewrites wrongly does not. Skips are logged at `debug` through `tracing`.
//!
//! ## Masters, Not Originals
//!
//! When WordPress downsizes a large upload to a `-scaled` master, every size
//! is computed from and served from the master. Attachment records carry the
//! master's file and dimensions; see [`library`].

pub mod config;
pub mod library;
pub mod naming;
pub mod output;
pub mod rewrite;
pub mod sizing;
pub mod url;

#[cfg(test)]
pub(crate) mod test_helpers;
