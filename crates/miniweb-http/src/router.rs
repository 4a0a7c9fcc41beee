//! Path-to-controller routing.

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub controller: String,
    pub action: String,
    pub params: Vec<String>,
}

impl Route {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            params: Vec::new(),
        }
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// A custom route matcher. Runs before the default convention and wins
/// when it returns `Some`.
pub type Matcher = dyn Fn(&str) -> Option<Route> + Send + Sync;

/// Resolve a path by convention.
///
/// The first segment (lowercased) names the controller, the second the
/// action, both defaulting to `index`; remaining segments become
/// percent-decoded positional parameters.
pub fn route(path: &str) -> Route {
    let path = match path.split_once('?') {
        Some((path, _)) => path,
        None => path,
    };

    let mut segments = path.trim_start_matches('/').split('/');

    let controller = match segments.next() {
        Some("") | None => "index".to_string(),
        Some(seg) => seg.to_lowercase(),
    };
    let action = match segments.next() {
        Some("") | None => "index".to_string(),
        Some(seg) => seg.to_lowercase(),
    };
    let params = segments.map(percent_decode).collect();

    Route {
        controller,
        action,
        params,
    }
}

/// Decode `%XX` escapes; malformed escapes pass through untouched.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
