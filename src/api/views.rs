//! HTML pages rendered with Handlebars.
//!
//! Templates are embedded at compile time; output is HTML-escaped by the engine.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

use crate::api::handlers::auth::{Account, FieldErrors, Flash};

pub struct Views(Handlebars<'static>);

impl Views {
    /// Register every page and partial.
    ///
    /// # Errors
    /// Returns an error if an embedded template fails to parse.
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();

        registry
            .register_partial("header", include_str!("../../templates/header.hbs"))
            .context("failed to register header partial")?;
        registry
            .register_partial("footer", include_str!("../../templates/footer.hbs"))
            .context("failed to register footer partial")?;

        for (name, source) in [
            ("index", include_str!("../../templates/index.hbs")),
            ("login", include_str!("../../templates/login.hbs")),
            ("register", include_str!("../../templates/register.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .with_context(|| format!("failed to register template {name}"))?;
        }

        Ok(Self(registry))
    }

    pub fn index(&self, account: &Account, flashes: &[Flash]) -> Result<String> {
        #[derive(Serialize)]
        struct Ctx<'a> {
            title: &'static str,
            flashes: &'a [Flash],
            account: &'a Account,
        }

        self.0
            .render(
                "index",
                &Ctx {
                    title: "Home",
                    flashes,
                    account,
                },
            )
            .context("failed to render index")
    }

    pub fn login(&self, username: &str, errors: &FieldErrors, flashes: &[Flash]) -> Result<String> {
        self.render_form("login", "Log in", username, errors, flashes)
    }

    pub fn register(
        &self,
        username: &str,
        errors: &FieldErrors,
        flashes: &[Flash],
    ) -> Result<String> {
        self.render_form("register", "Register", username, errors, flashes)
    }

    fn render_form(
        &self,
        name: &str,
        title: &'static str,
        username: &str,
        errors: &FieldErrors,
        flashes: &[Flash],
    ) -> Result<String> {
        #[derive(Serialize)]
        struct Ctx<'a> {
            title: &'static str,
            flashes: &'a [Flash],
            username: &'a str,
            errors: &'a FieldErrors,
        }

        self.0
            .render(
                name,
                &Ctx {
                    title,
                    flashes,
                    username,
                    errors,
                },
            )
            .with_context(|| format!("failed to render {name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views() -> Views {
        match Views::new() {
            Ok(views) => views,
            Err(err) => panic!("templates should parse: {err:#}"),
        }
    }

    #[test]
    fn index_shows_username_and_clicks() {
        let account = Account {
            id: 1,
            username: "alice".to_string(),
            clicks: 42,
        };
        let html = views().index(&account, &[]).unwrap_or_default();
        assert!(html.contains("Hello, alice!"));
        assert!(html.contains(r#"<p class="counter" id="clicks">42</p>"#));
        assert!(html.contains(r#"href="/click""#));
        assert!(html.contains(r#"href="/logout""#));
    }

    #[test]
    fn register_renders_field_errors_and_keeps_username() {
        let mut errors = FieldErrors::default();
        errors.add("confirm_password", "Field must be equal to password.");
        let html = views()
            .register("bob", &errors, &[])
            .unwrap_or_default();
        assert!(html.contains(r#"value="bob""#));
        assert!(html.contains(r#"<span class="error">Field must be equal to password.</span>"#));
    }

    #[test]
    fn login_renders_flashes() {
        let flashes = [Flash::danger("Invalid username or password.")];
        let html = views()
            .login("", &FieldErrors::default(), &flashes)
            .unwrap_or_default();
        assert!(html.contains(r#"<div class="flash flash-danger">Invalid username or password.</div>"#));
        assert!(html.contains(r#"action="/login""#));
    }

    #[test]
    fn user_input_is_escaped() {
        let html = views()
            .login("<script>alert(1)</script>", &FieldErrors::default(), &[])
            .unwrap_or_default();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
