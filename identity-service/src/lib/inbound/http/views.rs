use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::user::models::User;

const TEMPLATES: [(&str, &str); 6] = [
    ("layout.html", include_str!("../../../../templates/layout.html")),
    ("index.html", include_str!("../../../../templates/index.html")),
    ("signup.html", include_str!("../../../../templates/signup.html")),
    ("login.html", include_str!("../../../../templates/login.html")),
    ("secret.html", include_str!("../../../../templates/secret.html")),
    ("error.html", include_str!("../../../../templates/error.html")),
];

#[derive(Debug, Clone, Error)]
pub enum ViewError {
    #[error("Failed to load template {name}: {message}")]
    Load { name: &'static str, message: String },

    #[error("Failed to render {name}: {message}")]
    Render { name: String, message: String },
}

/// Compiled page templates.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, ViewError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(|e| ViewError::Load {
                name,
                message: e.to_string(),
            })?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>, ViewError> {
        let render_error = |e: minijinja::Error| ViewError::Render {
            name: name.to_string(),
            message: e.to_string(),
        };

        let template = self.env.get_template(name).map_err(render_error)?;
        template.render(context).map(Html).map_err(render_error)
    }
}

/// What the pages show about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub id: String,
    pub display_name: String,
    pub local_username: Option<String>,
    pub twitter: Option<TwitterView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwitterView {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            display_name: user.display_name().to_string(),
            local_username: user.local_username().map(|username| username.to_string()),
            twitter: user.twitter.as_ref().map(|twitter| TwitterView {
                id: twitter.id.to_string(),
                username: twitter.username.clone(),
                display_name: twitter.display_name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use minijinja::context;

    use super::*;
    use crate::user::models::LocalIdentity;
    use crate::user::models::Username;

    #[test]
    fn test_flash_messages_are_escaped() {
        let views = Views::new().unwrap();
        let Html(page) = views
            .render(
                "login.html",
                context! { messages => vec!["<b>Wrong password</b>"] },
            )
            .unwrap();

        assert!(page.contains("&lt;b&gt;Wrong password"));
        assert!(!page.contains("<b>Wrong password</b>"));
    }

    #[test]
    fn test_profile_page() {
        let views = Views::new().unwrap();
        let user = User::with_local(LocalIdentity {
            username: Username::new("alice".to_string()).unwrap(),
            password_hash: "$argon2id$hash".to_string(),
        });

        let Html(page) = views
            .render(
                "secret.html",
                context! { user => ProfileView::from(&user), twitter_enabled => true },
            )
            .unwrap();

        assert!(page.contains("alice"));
        assert!(page.contains("Link your Twitter account"));
    }

    #[test]
    fn test_unknown_template() {
        let views = Views::new().unwrap();
        let result = views.render("missing.html", context! {});
        assert!(matches!(result, Err(ViewError::Render { .. })));
    }
}
