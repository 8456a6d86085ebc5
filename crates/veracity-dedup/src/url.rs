//! Canonical URL keys
//!
//! Two URLs that differ only by tracking parameters, parameter order,
//! fragment, trailing slash, scheme/host case or a default port map to the
//! same key. Normalisation is idempotent.

use crate::DedupConfig;
use std::collections::HashSet;
use std::sync::LazyLock;
use ::url::Url;

static DEFAULT_NORMALIZER: LazyLock<UrlNormalizer> = LazyLock::new(UrlNormalizer::default);

/// Normalise a URL with the default tracking-parameter lists
pub fn normalize_url(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// URL normaliser with a configurable tracking-parameter list
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    params: HashSet<String>,
    prefixes: Vec<String>,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::from_config(&DedupConfig::default())
    }
}

impl UrlNormalizer {
    /// Build a normaliser from the deduplicator configuration
    pub fn from_config(config: &DedupConfig) -> Self {
        Self {
            params: config.tracking_params.iter().map(|p| p.to_lowercase()).collect(),
            prefixes: config.tracking_prefixes.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Whether a query parameter is a tracking parameter
    pub fn is_tracking_param(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.params.contains(&key) || self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Canonical key for `raw`
    ///
    /// Inputs that do not parse as hierarchical URLs fall back to the
    /// trimmed, lowercased input.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let mut url = match Url::parse(trimmed) {
            Ok(url) if !url.cannot_be_a_base() && url.has_host() => url,
            _ => return trimmed.to_lowercase(),
        };

        url.set_fragment(None);

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !self.is_tracking_param(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        pairs.sort();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        let path = url.path().trim_end_matches('/').to_string();
        if path.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&path);
        }

        let mut key = url.to_string();
        if url.path() == "/" && url.query().is_none() {
            key.pop();
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_tracking_and_fragment() {
        assert_eq!(
            normalize_url("https://example.org/story?utm_source=x&id=7&fbclid=abc#comments"),
            "https://example.org/story?id=7"
        );
    }

    #[test]
    fn test_tracking_variants_normalize_equal() {
        let a = normalize_url("https://news.example.com/a/b/?utm_campaign=spring");
        let b = normalize_url("HTTPS://News.Example.com/a/b?gclid=123");
        let c = normalize_url("https://news.example.com:443/a/b#top");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, "https://news.example.com/a/b");
    }

    #[test]
    fn test_param_order_irrelevant() {
        assert_eq!(
            normalize_url("https://example.org/s?b=2&a=1"),
            normalize_url("https://example.org/s?a=1&b=2")
        );
    }

    #[test]
    fn test_root_without_trailing_slash() {
        assert_eq!(normalize_url("https://Example.org/"), "https://example.org");
        assert_eq!(normalize_url("https://example.org"), "https://example.org");
    }

    #[test]
    fn test_unparseable_falls_back() {
        assert_eq!(normalize_url("  Not A URL  "), "not a url");
        assert_eq!(normalize_url("mailto:Someone@Example.org"), "mailto:someone@example.org");
    }

    #[test]
    fn test_custom_tracking_list() {
        let config = DedupConfig {
            tracking_params: vec!["session".into()],
            tracking_prefixes: vec![],
            ..DedupConfig::default()
        };
        let normalizer = UrlNormalizer::from_config(&config);
        assert_eq!(
            normalizer.normalize("https://a.org/x?session=1&utm_source=y"),
            "https://a.org/x?utm_source=y"
        );
    }

    fn url_strategy() -> impl Strategy<Value = String> {
        let scheme = prop_oneof![Just("http"), Just("https"), Just("HTTPS")];
        let host = "[a-zA-Z]{1,8}\\.(com|org|net)";
        let path = prop::collection::vec("[a-z0-9]{1,5}", 0..3);
        let trailing = any::<bool>();
        let params = prop::collection::vec(
            (
                prop_oneof![Just("utm_source"), Just("id"), Just("page"), Just("fbclid"), Just("q")],
                "[a-z0-9]{0,4}",
            ),
            0..4,
        );
        let fragment = prop::option::of("[a-z]{1,5}");
        (scheme, host, path, trailing, params, fragment).prop_map(|(scheme, host, path, trailing, params, fragment)| {
            let mut url = format!("{scheme}://{host}/{}", path.join("/"));
            if trailing && !path.is_empty() {
                url.push('/');
            }
            if !params.is_empty() {
                let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                url.push('?');
                url.push_str(&query.join("&"));
            }
            if let Some(fragment) = fragment {
                url.push('#');
                url.push_str(&fragment);
            }
            url
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(url in url_strategy()) {
            let once = normalize_url(&url);
            prop_assert_eq!(normalize_url(&once), once.clone());
        }

        #[test]
        fn normalized_has_no_tracking_or_fragment(url in url_strategy()) {
            let key = normalize_url(&url);
            prop_assert!(!key.contains("utm_source"));
            prop_assert!(!key.contains("fbclid"));
            prop_assert!(!key.contains('#'));
        }
    }
}
