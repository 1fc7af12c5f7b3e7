use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static LENIENT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+$").unwrap(/* known good */));

/// Why a long URL was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlDefect {
    Empty,
    MissingScheme,
    UnsupportedScheme(String),
    Malformed(String),
}

impl fmt::Display for UrlDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlDefect::Empty => write!(f, "URL is empty"),
            UrlDefect::MissingScheme => write!(f, "missing scheme, expected http:// or https://"),
            UrlDefect::UnsupportedScheme(scheme) => {
                write!(f, "unsupported scheme '{scheme}', expected http or https")
            }
            UrlDefect::Malformed(reason) => write!(f, "malformed URL: {reason}"),
        }
    }
}

/// Checks that a long URL is worth shortening.
///
/// A URL passes if it parses as an absolute http(s) URL with a host. As a
/// deliberate leniency, anything that fails strict parsing but still looks
/// like `http(s)://<non-whitespace>` passes too.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl UrlValidator {
    pub fn validate(url: &str) -> Result<(), UrlDefect> {
        let url = url.trim();
        if url.is_empty() {
            return Err(UrlDefect::Empty);
        }

        let parse_error = match Url::parse(url) {
            Ok(parsed) => return Self::check_parsed(&parsed),
            Err(e) => e,
        };

        if LENIENT_URL.is_match(url) {
            return Ok(());
        }

        match url.split_once("://") {
            None => Err(UrlDefect::MissingScheme),
            Some((scheme, _)) if scheme.is_empty() => Err(UrlDefect::MissingScheme),
            Some((scheme, _))
                if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") =>
            {
                Err(UrlDefect::UnsupportedScheme(scheme.to_string()))
            }
            Some(_) => Err(UrlDefect::Malformed(parse_error.to_string())),
        }
    }

    fn check_parsed(url: &Url) -> Result<(), UrlDefect> {
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(()),
            "http" | "https" => Err(UrlDefect::Malformed("missing host".to_string())),
            other => Err(UrlDefect::UnsupportedScheme(other.to_string())),
        }
    }
}
