//! Route guard.
//!
//! Pure routing policy: given a path and the current auth phase, decide
//! whether navigation proceeds, waits, or redirects to the login page.

use crate::auth::AuthPhase;

/// Routes reachable without a session.
const PUBLIC_ROUTES: [&str; 4] = ["/", "/auth", "/about", "/contact"];

/// Prefix for publicly shared roadmap links.
const SHARE_PREFIX: &str = "/share/roadmaps/";

/// Where unauthenticated navigation to a protected route lands.
pub const LOGIN_ROUTE: &str = "/auth?mode=login";

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Navigation proceeds.
    Allow,
    /// Auth state still resolving; hold navigation until it settles.
    Pending,
    /// Not signed in on a protected route.
    RedirectToLogin,
}

/// Whether `path` is reachable without a session.
pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path) || path.starts_with(SHARE_PREFIX)
}

/// Decide what happens when navigating to `path` in phase `phase`.
///
/// Public routes always allow, even mid-resolution, so the landing and
/// shared-roadmap pages never flash a redirect.
pub fn decide(path: &str, phase: AuthPhase) -> RouteDecision {
    if is_public(path) {
        return RouteDecision::Allow;
    }
    match phase {
        AuthPhase::Loading => RouteDecision::Pending,
        AuthPhase::SignedIn => RouteDecision::Allow,
        AuthPhase::SignedOut => RouteDecision::RedirectToLogin,
    }
}
