use url::Url;

/// Parses a base URL and makes sure joined paths append rather than replace.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `{base}{path}` where `path` is relative, e.g. `api/stream`.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    base.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_below_base_path() {
        let base = parse_base_url("http://localhost:8085/gateway").unwrap();
        assert_eq!(
            endpoint_url(&base, "/api/stream").unwrap().as_str(),
            "http://localhost:8085/gateway/api/stream"
        );
        let root = parse_base_url("http://localhost:8085").unwrap();
        assert_eq!(
            endpoint_url(&root, "api/auth/login").unwrap().as_str(),
            "http://localhost:8085/api/auth/login"
        );
    }
}
