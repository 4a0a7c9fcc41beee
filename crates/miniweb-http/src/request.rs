//! The incoming request model.

/// An incoming HTTP request.
///
/// The framework is server-agnostic; whatever accepts the connection
/// builds one of these and hands it to `App::handle`.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    path: String,
    query: String,
    headers: Vec<(String, String)>,
}

impl Request {
    /// Build a request from a method and target (`/path?query`).
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method: method.into().to_uppercase(),
            path: path.to_string(),
            query: query.to_string(),
            headers: Vec::new(),
        }
    }

    /// A GET request.
    pub fn get(target: &str) -> Self {
        Self::new("GET", target)
    }

    /// A POST request.
    pub fn post(target: &str) -> Self {
        Self::new("POST", target)
    }

    /// Attach a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a Host header.
    pub fn host(self, host: impl Into<String>) -> Self {
        self.header("Host", host)
    }

    /// Attach one cookie, appending to any existing Cookie header.
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{name}={value}");
        if let Some((_, existing)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case("Cookie"))
        {
            existing.push_str("; ");
            existing.push_str(&pair);
            return self;
        }
        self.header("Cookie", pair)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path, query string already stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// First header with the given name, case-insensitive.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The Host header, or empty.
    pub fn host_name(&self) -> &str {
        self.header_value("Host").unwrap_or("")
    }

    /// A cookie value by name, raw (not percent-decoded).
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        let header = self.header_value("Cookie")?;
        header.split(';').find_map(|pair| {
            let (n, v) = pair.trim().split_once('=')?;
            (n == name).then_some(v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_query_from_path() {
        let req = Request::get("/blog/show/3?draft=1");
        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/blog/show/3");
        assert_eq!(req.query(), "draft=1");

        let req = Request::get("/plain");
        assert_eq!(req.path(), "/plain");
        assert_eq!(req.query(), "");
    }

    #[test]
    fn headers_case_insensitive() {
        let req = Request::get("/").header("Content-Type", "text/plain").host("example.com");
        assert_eq!(req.header_value("content-type"), Some("text/plain"));
        assert_eq!(req.host_name(), "example.com");
    }

    #[test]
    fn cookie_parsing() {
        let req = Request::get("/").cookie("a", "1").cookie("session", "x%7Cy");
        assert_eq!(req.cookie_value("a"), Some("1"));
        assert_eq!(req.cookie_value("session"), Some("x%7Cy"));
        assert_eq!(req.cookie_value("missing"), None);
    }
}
