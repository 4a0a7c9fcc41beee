use miniweb::prelude::*;
use miniweb::SESSION_COOKIE;

struct Account;

impl Controller for Account {
    fn call(&mut self, action: &str, ctx: &mut Context, params: &[String]) -> Result<Outcome> {
        match action {
            "login" => {
                let user = params
                    .first()
                    .cloned()
                    .ok_or_else(|| Error::not_found("Missing user"))?;
                ctx.session.set("user", user);
                ctx.json(&serde_json::json!({"ok": true}))
            }
            "whoami" => {
                let user = ctx
                    .session
                    .get("user")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                ctx.json(&serde_json::json!({"user": user}))
            }
            "logout" => {
                ctx.session.delete("user");
                ctx.json(&serde_json::json!({"ok": true}))
            }
            other => Err(Error::not_found(format!("Action not found: {other}"))),
        }
    }
}

fn app(secret: &str, domain: Option<&str>) -> App {
    let mut config = AppConfig::new()
        .database_url("sqlite::memory:")
        .session_secret(secret)
        .production(true);
    if let Some(domain) = domain {
        config = config.session_domain(domain);
    }
    let db = Database::from_config(&config).unwrap();
    App::new(config, Orm::new(db, SchemaRegistry::new()))
        .controller("account", || Box::new(Account))
}

/// The raw cookie value out of a Set-Cookie header.
fn cookie_value(response: &Response) -> String {
    let header = response.header_value("Set-Cookie").unwrap();
    let pair = header.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, SESSION_COOKIE);
    value.to_string()
}

#[test]
fn session_survives_the_round_trip() {
    let app = app("s3cret", Some("example.com"));

    let login = app.handle(Request::get("/account/login/ada"));
    let cookie = cookie_value(&login);

    let whoami = app.handle(Request::get("/account/whoami").cookie(SESSION_COOKIE, &cookie));
    assert_eq!(whoami.body(), "{\"user\":\"ada\"}");
    // Nothing changed, so no new cookie is sent.
    assert!(whoami.header_value("Set-Cookie").is_none());
}

#[test]
fn cookie_attributes() {
    let app = app("s3cret", Some("example.com"));
    let login = app.handle(Request::get("/account/login/ada"));

    let header = login.header_value("Set-Cookie").unwrap();
    assert!(header.contains("Max-Age=2592000"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Domain=example.com"));
    assert!(header.contains("Secure"));
}

#[test]
fn tampered_cookie_yields_an_empty_session() {
    let app = app("s3cret", Some("example.com"));

    let login = app.handle(Request::get("/account/login/ada"));
    let cookie = cookie_value(&login);
    let tampered = cookie.replace("ada", "eve");

    let whoami = app.handle(Request::get("/account/whoami").cookie(SESSION_COOKIE, &tampered));
    assert_eq!(whoami.body(), "{\"user\":null}");
}

#[test]
fn cookie_is_bound_to_the_signing_secret() {
    let cookie = cookie_value(&app("first", Some("example.com")).handle(
        Request::get("/account/login/ada"),
    ));

    let other = app("second", Some("example.com"));
    let whoami = other.handle(Request::get("/account/whoami").cookie(SESSION_COOKIE, &cookie));
    assert_eq!(whoami.body(), "{\"user\":null}");
}

#[test]
fn cookie_is_bound_to_the_domain() {
    // Without a configured domain, the request host signs the cookie.
    let app = app("s3cret", None);
    let login = app.handle(Request::get("/account/login/ada").host("a.example.com"));
    let cookie = cookie_value(&login);

    let same = app.handle(
        Request::get("/account/whoami")
            .host("a.example.com")
            .cookie(SESSION_COOKIE, &cookie),
    );
    assert_eq!(same.body(), "{\"user\":\"ada\"}");

    let other = app.handle(
        Request::get("/account/whoami")
            .host("b.example.com")
            .cookie(SESSION_COOKIE, &cookie),
    );
    assert_eq!(other.body(), "{\"user\":null}");
}

#[test]
fn logout_deletes_the_key_and_reissues_the_cookie() {
    let app = app("s3cret", Some("example.com"));

    let login = app.handle(Request::get("/account/login/ada"));
    let cookie = cookie_value(&login);

    let logout = app.handle(Request::get("/account/logout").cookie(SESSION_COOKIE, &cookie));
    let cleared = cookie_value(&logout);

    let whoami = app.handle(Request::get("/account/whoami").cookie(SESSION_COOKIE, &cleared));
    assert_eq!(whoami.body(), "{\"user\":null}");
}

#[test]
fn missing_secret_fails_every_request() {
    let config = AppConfig::new().database_url("sqlite::memory:");
    let db = Database::from_config(&config).unwrap();
    let app = App::new(config, Orm::new(db, SchemaRegistry::new()))
        .controller("account", || Box::new(Account));

    let response = app.handle(Request::get("/account/whoami"));
    assert_eq!(response.status(), 500);
}
