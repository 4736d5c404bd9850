//! Navigation gate for the dashboard's protected views.
//!
//! Only the presence of the authentication marker is checked. The marker is
//! not validated, so this is a convenience redirect and not a trust boundary.

use resoluty_core::{AppError, AppResult};
use serde::Serialize;

/// Cookie carrying the authentication marker set by the login page.
pub const AUTH_MARKER_COOKIE: &str = "auth-token";

const DEFAULT_PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/comercial",
    "/financeiro",
    "/gestao",
    "/customer-success",
    "/administrativo",
];

// Matched against the path without its leading slash.
const UNGATED_PREFIXES: &[&str] = &["api", "_next/static", "_next/image", "favicon.ico"];

/// Result of evaluating one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Render the requested view.
    Allow,
    /// Send the browser elsewhere.
    Redirect {
        /// Path to navigate to.
        location: String,
    },
}

/// Path policy deciding which views require the authentication marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGate {
    protected_prefixes: Vec<String>,
    login_path: String,
    home_path: String,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self {
            protected_prefixes: DEFAULT_PROTECTED_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_owned())
                .collect(),
            login_path: "/login".to_owned(),
            home_path: "/dashboard".to_owned(),
        }
    }
}

impl SessionGate {
    /// Creates a gate with a custom policy.
    pub fn new(
        protected_prefixes: Vec<String>,
        login_path: impl Into<String>,
        home_path: impl Into<String>,
    ) -> AppResult<Self> {
        let login_path = login_path.into();
        let home_path = home_path.into();

        for path in [&login_path, &home_path]
            .into_iter()
            .chain(protected_prefixes.iter())
        {
            if !path.starts_with('/') {
                return Err(AppError::Validation(format!(
                    "gate path '{path}' must start with '/'"
                )));
            }
        }

        if protected_prefixes
            .iter()
            .any(|prefix| login_path.starts_with(prefix.as_str()))
        {
            return Err(AppError::Validation(format!(
                "login path '{login_path}' must not be protected"
            )));
        }

        Ok(Self {
            protected_prefixes,
            login_path,
            home_path,
        })
    }

    /// Returns the login path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        self.login_path.as_str()
    }

    /// Returns the path signed-in users land on.
    #[must_use]
    pub fn home_path(&self) -> &str {
        self.home_path.as_str()
    }

    /// Returns whether `path` requires the authentication marker.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decides whether a navigation to `path` may render.
    #[must_use]
    pub fn evaluate(&self, path: &str, marker_present: bool) -> GateDecision {
        if is_ungated(path) {
            return GateDecision::Allow;
        }

        if self.is_protected(path) && !marker_present {
            return GateDecision::Redirect {
                location: self.login_path().to_owned(),
            };
        }

        if path == self.login_path() && marker_present {
            return GateDecision::Redirect {
                location: self.home_path().to_owned(),
            };
        }

        GateDecision::Allow
    }
}

fn is_ungated(path: &str) -> bool {
    let relative = path.strip_prefix('/').unwrap_or(path);
    UNGATED_PREFIXES
        .iter()
        .any(|prefix| relative.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::{GateDecision, SessionGate};

    fn redirect(location: &str) -> GateDecision {
        GateDecision::Redirect {
            location: location.to_owned(),
        }
    }

    #[test]
    fn protected_paths_without_marker_redirect_to_login() {
        let gate = SessionGate::default();
        for path in [
            "/dashboard",
            "/comercial",
            "/financeiro/relatorios",
            "/gestao",
            "/customer-success/atendimentos",
            "/administrativo",
        ] {
            assert_eq!(gate.evaluate(path, false), redirect("/login"), "{path}");
        }
    }

    #[test]
    fn protected_paths_with_marker_are_allowed() {
        let gate = SessionGate::default();
        assert_eq!(gate.evaluate("/comercial", true), GateDecision::Allow);
    }

    #[test]
    fn login_with_marker_redirects_home() {
        let gate = SessionGate::default();
        assert_eq!(gate.evaluate("/login", true), redirect("/dashboard"));
        assert_eq!(gate.evaluate("/login", false), GateDecision::Allow);
    }

    #[test]
    fn public_paths_are_allowed() {
        let gate = SessionGate::default();
        assert_eq!(gate.evaluate("/", false), GateDecision::Allow);
        assert_eq!(gate.evaluate("/sobre", false), GateDecision::Allow);
    }

    #[test]
    fn api_and_asset_paths_are_never_gated() {
        let gate = SessionGate::new(vec!["/api".to_owned()], "/login", "/dashboard")
            .unwrap_or_else(|_| panic!("valid policy"));
        assert_eq!(gate.evaluate("/api/stats", false), GateDecision::Allow);
        assert_eq!(gate.evaluate("/_next/static/chunk.js", false), GateDecision::Allow);
        assert_eq!(gate.evaluate("/favicon.ico", false), GateDecision::Allow);
    }

    #[test]
    fn custom_policy_validates_paths() {
        assert!(SessionGate::new(vec!["relatorios".to_owned()], "/login", "/home").is_err());
        assert!(SessionGate::new(vec!["/login".to_owned()], "/login", "/home").is_err());

        let gate = SessionGate::new(vec!["/relatorios".to_owned()], "/entrar", "/relatorios")
            .unwrap_or_else(|_| panic!("valid policy"));
        assert_eq!(gate.login_path(), "/entrar");
        assert_eq!(gate.home_path(), "/relatorios");
        assert_eq!(gate.evaluate("/relatorios/q1", false), redirect("/entrar"));
        assert_eq!(gate.evaluate("/entrar", true), redirect("/relatorios"));
    }
}
