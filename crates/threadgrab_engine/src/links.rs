use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use grab_logging::{grab_debug, grab_warn};
use regex::Regex;
use scraper::{Html, Selector};
use threadgrab_core::{ExtractPattern, MediaUrl, SeedUrl};

use crate::decode::decode_page;
use crate::fetch::Fetcher;

static SOURCE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/[^"/\s]+/src/\d+/\d+\.[^"\s]+)""#).expect("source href pattern compiles")
});

/// Scans one decoded page for media links and makes them absolute under
/// `origin`. Set semantics: a link found twice on the page appears once.
pub fn extract_media_urls(
    html: &str,
    pattern: &ExtractPattern,
    origin: &str,
) -> BTreeSet<MediaUrl> {
    let candidates = match pattern {
        ExtractPattern::SourceHref => source_hrefs(html),
        ExtractPattern::ImageDataSrc { excluded_prefix } => image_data_srcs(html, excluded_prefix),
    };

    candidates
        .into_iter()
        .filter_map(|path| match MediaUrl::from_relative(origin, &path) {
            Ok(url) => Some(url),
            Err(err) => {
                grab_debug!("Skipping unusable media path {}: {}", path, err);
                None
            }
        })
        .collect()
}

fn source_hrefs(html: &str) -> Vec<String> {
    SOURCE_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|path| path.as_str().to_string())
        .collect()
}

fn image_data_srcs(html: &str, excluded_prefix: &str) -> Vec<String> {
    let Some(selector) = Selector::parse("img[data-src]").ok() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|img| img.value().attr("data-src"))
        .map(str::trim)
        .filter(|src| src.starts_with('/'))
        .filter(|src| excluded_prefix.is_empty() || !src.starts_with(excluded_prefix))
        .map(ToOwned::to_owned)
        .collect()
}

/// Produces the media links for one seed. Implementations swallow their own
/// failures: a seed that cannot be read yields an empty set.
#[async_trait::async_trait]
pub trait LinkSource: Send + Sync {
    async fn collect(&self, seed: &SeedUrl) -> BTreeSet<MediaUrl>;
}

/// Fetches the thread page and runs [`extract_media_urls`] over it.
pub struct PageLinkExtractor {
    fetcher: Arc<dyn Fetcher>,
    pattern: ExtractPattern,
    origin: String,
}

impl PageLinkExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, pattern: ExtractPattern, origin: impl Into<String>) -> Self {
        Self {
            fetcher,
            pattern,
            origin: origin.into(),
        }
    }
}

#[async_trait::async_trait]
impl LinkSource for PageLinkExtractor {
    async fn collect(&self, seed: &SeedUrl) -> BTreeSet<MediaUrl> {
        let output = match self.fetcher.fetch(seed.as_str()).await {
            Ok(output) => output,
            Err(err) => {
                grab_warn!("Failed to fetch {}: {}", seed, err);
                return BTreeSet::new();
            }
        };

        if output.metadata.final_url != seed.as_str() {
            grab_debug!("{} redirected to {}", seed, output.metadata.final_url);
        }
        let page = decode_page(&output.bytes, output.metadata.content_type.as_deref());
        if page.lossy {
            grab_warn!(
                "{} is not valid {}; unreadable bytes were replaced",
                seed,
                page.encoding_label
            );
        }
        grab_debug!(
            "Decoded {} ({} bytes) as {}",
            seed,
            output.metadata.byte_len,
            page.encoding_label
        );
        extract_media_urls(&page.text, &self.pattern, &self.origin)
    }
}
