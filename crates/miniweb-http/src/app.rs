//! The dispatcher: request in, response out.

use crate::context::Context;
use crate::controller::{Controller, ControllerFactory, Outcome};
use crate::request::Request;
use crate::response::Response;
use crate::router::{Matcher, Route, route};
use miniweb_core::{AppConfig, Error, Result};
use miniweb_session::{SESSION_COOKIE, Session, SessionConfig};
use miniweb_table::Orm;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The controller name that receives failed requests.
const ERROR_CONTROLLER: &str = "error";

/// The application: registered controllers plus everything shared
/// between requests.
pub struct App {
    config: AppConfig,
    orm: Arc<Orm>,
    controllers: HashMap<String, ControllerFactory>,
    matcher: Option<Box<Matcher>>,
    view_root: PathBuf,
}

impl App {
    pub fn new(config: AppConfig, orm: Orm) -> Self {
        Self {
            config,
            orm: Arc::new(orm),
            controllers: HashMap::new(),
            matcher: None,
            view_root: PathBuf::from("views"),
        }
    }

    /// Register a controller under a routable name.
    pub fn controller<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.controllers.insert(name.into(), Box::new(factory));
        self
    }

    /// Install a custom route matcher. It runs before the path
    /// convention and wins when it returns `Some`.
    pub fn matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&str) -> Option<Route> + Send + Sync + 'static,
    {
        self.matcher = Some(Box::new(matcher));
        self
    }

    /// Where conventional templates live; defaults to `views/`.
    pub fn view_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.view_root = root.into();
        self
    }

    pub fn orm(&self) -> Arc<Orm> {
        Arc::clone(&self.orm)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve one request.
    ///
    /// Never returns an error: failures route to the `error` controller
    /// when one is registered, otherwise to a built-in minimal response.
    pub fn handle(&self, request: Request) -> Response {
        let request_for_errors = request.clone();

        let mut ctx = match self.make_context(request) {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::error!(target: "miniweb::http", error = %err, "cannot build request context");
                return Response::new(500);
            }
        };

        let route = self
            .matcher
            .as_ref()
            .and_then(|m| m(ctx.request.path()))
            .unwrap_or_else(|| route(ctx.request.path()));

        match self.run(&route, &mut ctx) {
            Ok(()) => Self::finalize(ctx),
            Err(err) => self.handle_error(err, request_for_errors),
        }
    }

    fn run(&self, route: &Route, ctx: &mut Context) -> Result<()> {
        let factory = self.controllers.get(&route.controller).ok_or_else(|| {
            Error::not_found(format!("Controller not found: {}", route.controller))
        })?;

        let mut controller = factory();
        controller.init(ctx)?;
        match controller.call(&route.action, ctx, &route.params)? {
            Outcome::Rendered => {
                let template = self
                    .view_root
                    .join(&route.controller)
                    .join(format!("{}.html", route.action));
                let html = ctx.view.render(&template)?;
                ctx.response.set_html(html);
            }
            Outcome::NoView => {}
        }
        Ok(())
    }

    fn handle_error(&self, err: Error, request: Request) -> Response {
        let status = if err.is_not_found() { 404 } else { 500 };
        if status == 500 {
            tracing::error!(target: "miniweb::http", error = %err, "request failed");
        }

        let Some(factory) = self.controllers.get(ERROR_CONTROLLER) else {
            return self.default_error_response(status, &err);
        };

        let Ok(mut ctx) = self.make_context(request) else {
            return Response::new(500);
        };
        ctx.response.set_status(status);
        ctx.error = Some(err);

        let mut controller = factory();
        let outcome = controller
            .init(&mut ctx)
            .and_then(|()| controller.call(ERROR_CONTROLLER, &mut ctx, &[]));
        match outcome {
            Ok(Outcome::Rendered) => {
                let template = self
                    .view_root
                    .join(ERROR_CONTROLLER)
                    .join(format!("{ERROR_CONTROLLER}.html"));
                match ctx.view.render(&template) {
                    Ok(html) => {
                        ctx.response.set_html(html);
                        Self::finalize(ctx)
                    }
                    Err(_) => Response::new(500),
                }
            }
            Ok(Outcome::NoView) => Self::finalize(ctx),
            Err(_) => Response::new(500),
        }
    }

    /// The response when no error controller is registered. Production
    /// keeps the body bare; development spells the failure out.
    fn default_error_response(&self, status: u16, err: &Error) -> Response {
        if self.config.production {
            return Response::new(status);
        }
        let mut body = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            body.push_str("\ncaused by: ");
            body.push_str(&cause.to_string());
            source = cause.source();
        }
        Response::text(status, body)
    }

    fn make_context(&self, request: Request) -> Result<Context> {
        let domain = self
            .config
            .session_domain
            .clone()
            .unwrap_or_else(|| request.host_name().to_string());
        let session_config = SessionConfig::new(self.config.session_secret.clone(), domain)?;
        let session = Session::load(session_config, request.cookie_value(SESSION_COOKIE));
        Ok(Context::new(
            request,
            session,
            Arc::clone(&self.orm),
            self.config.clone(),
        ))
    }

    /// Attach the pending session cookie, if any, and hand the response
    /// back.
    fn finalize(mut ctx: Context) -> Response {
        if let Some(cookie) = ctx.session.cookie_header() {
            ctx.response.add_header("Set-Cookie", cookie);
        }
        ctx.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniweb_db::Database;
    use miniweb_table::SchemaRegistry;

    struct Hello;

    impl Controller for Hello {
        fn call(&mut self, action: &str, ctx: &mut Context, params: &[String]) -> Result<Outcome> {
            match action {
                "index" => ctx.json(&serde_json::json!({"hello": "world"})),
                "echo" => ctx.json(&serde_json::json!({"params": params})),
                "remember" => {
                    ctx.session.set("seen", true);
                    ctx.json(&serde_json::json!({"ok": true}))
                }
                "boom" => Err(Error::Custom("kaput".to_string())),
                other => Err(Error::not_found(format!("Action not found: {other}"))),
            }
        }
    }

    struct ErrorPage;

    impl Controller for ErrorPage {
        fn call(&mut self, _action: &str, ctx: &mut Context, _params: &[String]) -> Result<Outcome> {
            let message = ctx
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let status = ctx.response.status();
            ctx.json(&serde_json::json!({"status": status, "message": message}))
        }
    }

    fn app(production: bool) -> App {
        let config = AppConfig::new()
            .database_url("sqlite::memory:")
            .session_secret("test-secret")
            .session_domain("example.com")
            .production(production);
        let db = Database::from_config(&config).unwrap();
        let orm = Orm::new(db, SchemaRegistry::new());
        App::new(config, orm).controller("hello", || Box::new(Hello))
    }

    #[test]
    fn dispatches_by_convention() {
        let response = app(false).handle(Request::get("/hello"));
        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "{\"hello\":\"world\"}");
    }

    #[test]
    fn extra_segments_become_params() {
        let response = app(false).handle(Request::get("/hello/echo/a/b%20c"));
        assert_eq!(response.body(), "{\"params\":[\"a\",\"b c\"]}");
    }

    #[test]
    fn unknown_controller_is_404() {
        let response = app(false).handle(Request::get("/nope"));
        assert_eq!(response.status(), 404);
        assert!(response.body().contains("Controller not found"));
    }

    #[test]
    fn unknown_action_is_404() {
        let response = app(false).handle(Request::get("/hello/nope"));
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn production_errors_have_bare_bodies() {
        let response = app(true).handle(Request::get("/hello/boom"));
        assert_eq!(response.status(), 500);
        assert_eq!(response.body(), "");

        let response = app(false).handle(Request::get("/hello/boom"));
        assert_eq!(response.status(), 500);
        assert!(response.body().contains("kaput"));
    }

    #[test]
    fn error_controller_takes_over() {
        let app = app(true).controller("error", || Box::new(ErrorPage));
        let response = app.handle(Request::get("/nope"));
        assert_eq!(response.status(), 404);
        assert!(response.body().contains("Controller not found"));

        let response = app.handle(Request::get("/hello/boom"));
        assert_eq!(response.status(), 500);
        assert!(response.body().contains("kaput"));
    }

    #[test]
    fn matcher_wins_over_convention() {
        let app = app(false).matcher(|path| {
            (path == "/legacy").then(|| Route::new("hello", "index"))
        });
        let response = app.handle(Request::get("/legacy"));
        assert_eq!(response.body(), "{\"hello\":\"world\"}");
    }

    #[test]
    fn session_mutation_sets_cookie() {
        let app = app(false);

        let response = app.handle(Request::get("/hello").host("example.com"));
        assert!(response.header_value("Set-Cookie").is_none());

        let response = app.handle(Request::get("/hello/remember").host("example.com"));
        let cookie = response.header_value("Set-Cookie").unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert!(cookie.contains("Domain=example.com"));
    }
}
