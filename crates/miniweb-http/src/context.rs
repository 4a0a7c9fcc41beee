//! Per-request state handed to controllers.

use crate::controller::Outcome;
use crate::request::Request;
use crate::response::Response;
use crate::view::View;
use miniweb_core::{AppConfig, Error, Result};
use miniweb_session::Session;
use miniweb_table::Orm;
use std::sync::Arc;

/// Everything an action can touch for one request.
pub struct Context {
    pub request: Request,
    pub response: Response,
    pub view: View,
    pub session: Session,
    pub orm: Arc<Orm>,
    pub config: AppConfig,
    /// Set by the dispatcher when the error controller runs; the failure
    /// that brought the request here.
    pub error: Option<Error>,
}

impl Context {
    pub fn new(
        request: Request,
        session: Session,
        orm: Arc<Orm>,
        config: AppConfig,
    ) -> Self {
        let mut view = View::new();
        if let Some(name) = &config.app_name {
            view.set("app_name", name.clone());
        }
        Self {
            request,
            response: Response::ok(),
            view,
            session,
            orm,
            config,
            error: None,
        }
    }

    /// Answer with a JSON body and skip template rendering.
    pub fn json(&mut self, value: &serde_json::Value) -> Result<Outcome> {
        self.response
            .set_header("Content-Type", "application/json; charset=utf-8");
        self.response.set_body(value.to_string());
        Ok(Outcome::NoView)
    }

    /// JSON answer that any origin may read.
    pub fn cors_json(&mut self, value: &serde_json::Value) -> Result<Outcome> {
        self.response.set_header("Access-Control-Allow-Origin", "*");
        self.response.set_header("Access-Control-Allow-Methods", "GET");
        self.json(value)
    }

    /// A 302 redirect.
    pub fn redirect(&mut self, location: &str) -> Result<Outcome> {
        self.redirect_with(302, location)
    }

    /// A tiny page that pops a browser alert, then navigates away.
    pub fn alert(&mut self, message: &str, location: &str) -> Result<Outcome> {
        let body = format!(
            "<script>alert({}); document.location = {};</script>",
            js_string(message),
            js_string(location)
        );
        self.response.set_html(body);
        Ok(Outcome::NoView)
    }

    pub fn redirect_with(&mut self, status: u16, location: &str) -> Result<Outcome> {
        self.response.set_status(status);
        self.response.set_header("Location", location);
        Ok(Outcome::NoView)
    }
}

/// A JSON string literal doubles as a JS one; `<` is escaped so a
/// `</script>` inside the text cannot close the tag.
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace('<', "\\u003c")
}
