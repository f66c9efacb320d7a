use url::Url;

/// Extracts the pacing key of a URL
///
/// The key is the lowercase host, followed by `:port` when the URL carries a
/// port other than its scheme's default. Two servers on the same host but
/// different ports are paced independently.
///
/// # Arguments
///
/// * `url` - The URL to extract the key from
///
/// # Returns
///
/// * `Some(String)` - The pacing key
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use directory_harvest::url::domain_key;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(domain_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(domain_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn domain_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
