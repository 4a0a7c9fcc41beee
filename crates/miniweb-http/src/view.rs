//! Template variables and minimal substitution rendering.

use miniweb_core::error::TemplateError;
use miniweb_core::{Error, Result};
use std::path::Path;

/// Partial includes deeper than this are treated as a cycle.
const MAX_PARTIAL_DEPTH: usize = 16;

/// Template variables plus the substitution renderer.
///
/// Three forms are recognized: `{{name}}` substitutes the HTML-escaped
/// variable, `{{{name}}}` substitutes it raw, and `{{> path}}` includes
/// the named partial (relative to the including file) with the current
/// variables. Anything else in the template passes through untouched.
#[derive(Debug, Clone, Default)]
pub struct View {
    vars: Vec<(String, serde_json::Value)>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any existing one with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.vars.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.vars.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// HTML-escape a string.
    pub fn escape(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    }

    /// Render a template file with the current variables.
    ///
    /// A template that cannot be read is a hard error; there is no
    /// fallback page.
    pub fn render(&self, path: &Path) -> Result<String> {
        self.render_at_depth(path, 0)
    }

    /// Render a partial with `vars` swapped in for the duration; the
    /// caller's variable set is restored afterwards, so partials nest
    /// without bleeding state.
    pub fn partial(&mut self, path: &Path, vars: View) -> Result<String> {
        let saved = std::mem::replace(&mut self.vars, vars.vars);
        let result = self.render(path);
        self.vars = saved;
        result
    }

    fn render_at_depth(&self, path: &Path, depth: usize) -> Result<String> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Template(TemplateError {
                template: path.display().to_string(),
                message: format!("cannot read template: {e}"),
            })
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.render_source(&source, dir, path, depth)
    }

    fn render_source(
        &self,
        source: &str,
        dir: &Path,
        template: &Path,
        depth: usize,
    ) -> Result<String> {
        if depth > MAX_PARTIAL_DEPTH {
            return Err(Error::Template(TemplateError {
                template: template.display().to_string(),
                message: "partial include depth exceeded".to_string(),
            }));
        }

        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let tag = &rest[start..];

            if let Some(inner) = tag.strip_prefix("{{{") {
                match inner.find("}}}") {
                    Some(end) => {
                        out.push_str(&self.lookup(inner[..end].trim()));
                        rest = &inner[end + 3..];
                    }
                    None => {
                        out.push_str(tag);
                        rest = "";
                    }
                }
            } else if let Some(inner) = tag.strip_prefix("{{>") {
                match inner.find("}}") {
                    Some(end) => {
                        let name = inner[..end].trim();
                        let included = dir.join(name);
                        out.push_str(&self.render_at_depth(&included, depth + 1)?);
                        rest = &inner[end + 2..];
                    }
                    None => {
                        out.push_str(tag);
                        rest = "";
                    }
                }
            } else {
                let inner = &tag[2..];
                match inner.find("}}") {
                    Some(end) => {
                        out.push_str(&Self::escape(&self.lookup(inner[..end].trim())));
                        rest = &inner[end + 2..];
                    }
                    None => {
                        out.push_str(tag);
                        rest = "";
                    }
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }

    /// A variable as template text. Missing and null variables render as
    /// nothing; structured values render as JSON.
    fn lookup(&self, name: &str) -> String {
        match self.get(name) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(label: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("miniweb_view_{label}_{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.0.join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn escaped_and_raw_substitution() {
        let dir = TempDir::new("subst");
        let tpl = dir.write("page.html", "<h1>{{title}}</h1>{{{markup}}}");

        let mut view = View::new();
        view.set("title", "Tom & Jerry <3");
        view.set("markup", "<em>raw</em>");

        assert_eq!(
            view.render(&tpl).unwrap(),
            "<h1>Tom &amp; Jerry &lt;3</h1><em>raw</em>"
        );
    }

    #[test]
    fn missing_variables_render_empty() {
        let dir = TempDir::new("missing");
        let tpl = dir.write("page.html", "a{{nothing}}b");
        assert_eq!(View::new().render(&tpl).unwrap(), "ab");
    }

    #[test]
    fn structured_values_render_as_json() {
        let dir = TempDir::new("json");
        let tpl = dir.write("page.html", "{{{data}}}");
        let mut view = View::new();
        view.set("data", serde_json::json!({"n": 1}));
        assert_eq!(view.render(&tpl).unwrap(), "{\"n\":1}");
    }

    #[test]
    fn partial_include_shares_variables() {
        let dir = TempDir::new("include");
        dir.write("header.html", "<title>{{title}}</title>");
        let tpl = dir.write("page.html", "{{> header.html}}<p>{{title}}</p>");

        let mut view = View::new();
        view.set("title", "Hi");
        assert_eq!(
            view.render(&tpl).unwrap(),
            "<title>Hi</title><p>Hi</p>"
        );
    }

    #[test]
    fn partial_call_restores_caller_variables() {
        let dir = TempDir::new("partial");
        let item = dir.write("item.html", "[{{name}}]");

        let mut view = View::new();
        view.set("name", "outer");

        let mut inner = View::new();
        inner.set("name", "inner");

        assert_eq!(view.partial(&item, inner).unwrap(), "[inner]");
        assert_eq!(view.get("name"), Some(&serde_json::json!("outer")));
    }

    #[test]
    fn missing_template_is_hard_error() {
        let err = View::new()
            .render(Path::new("/nonexistent/none.html"))
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn include_cycle_detected() {
        let dir = TempDir::new("cycle");
        let tpl = dir.write("loop.html", "{{> loop.html}}");
        let err = View::new().render(&tpl).unwrap_err();
        match err {
            Error::Template(t) => assert!(t.message.contains("depth")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_tags_pass_through() {
        let dir = TempDir::new("unterminated");
        let tpl = dir.write("page.html", "before {{oops");
        assert_eq!(View::new().render(&tpl).unwrap(), "before {{oops");
    }
}
