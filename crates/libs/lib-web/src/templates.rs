//! # HTML Templates
//!
//! Jinja-style templates rendered with `minijinja`. Sources are compiled
//! into the binary; a syntax error surfaces when [`Templates::new`] runs at
//! startup. Autoescaping is on for every `.html` template.

use axum::response::Html;
use lib_core::AppError;
use minijinja::Environment;
use serde::Serialize;

const SOURCES: [(&str, &str); 5] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("chatbot.html", include_str!("../templates/chatbot.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in SOURCES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map(Html)
            .map_err(|e| AppError::Internal(format!("rendering {name} failed: {e}")))
    }
}
