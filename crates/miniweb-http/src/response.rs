//! The outgoing response model.

/// An HTTP response under construction.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Set a header, replacing an existing one with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            entry.1 = value;
        } else {
            self.headers.push((name, value));
        }
    }

    /// Append a header without replacing; needed for Set-Cookie.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Set an HTML body, with the content type unless already set.
    pub fn set_html(&mut self, body: impl Into<String>) {
        if self.header_value("Content-Type").is_none() {
            self.set_header("Content-Type", "text/html; charset=utf-8");
        }
        self.body = body.into();
    }

    /// A plain-text response in one call.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::new(status);
        response.set_header("Content-Type", "text/plain; charset=utf-8");
        response.set_body(body);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_add_appends() {
        let mut response = Response::ok();
        response.set_header("Content-Type", "text/plain");
        response.set_header("content-type", "application/json");
        assert_eq!(
            response.header_value("Content-Type"),
            Some("application/json")
        );
        assert_eq!(response.headers().count(), 1);

        response.add_header("Set-Cookie", "a=1");
        response.add_header("Set-Cookie", "b=2");
        assert_eq!(
            response
                .headers()
                .filter(|(n, _)| *n == "Set-Cookie")
                .count(),
            2
        );
    }

    #[test]
    fn html_keeps_existing_content_type() {
        let mut response = Response::ok();
        response.set_header("Content-Type", "application/xhtml+xml");
        response.set_html("<p>hi</p>");
        assert_eq!(
            response.header_value("Content-Type"),
            Some("application/xhtml+xml")
        );
        assert_eq!(response.body(), "<p>hi</p>");
    }
}
