//! Route guard
//!
//! Named routes of the client and the access decision for each one. Page
//! rendering is left to the host; only the decision is modelled here.

use std::fmt;

use dictators_domain::constants::{
    ROUTE_CREATE_PROFILE, ROUTE_DICTATORS, ROUTE_HOME, ROUTE_PROFILE,
};

use crate::session::SessionState;

/// Client routes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Dictators,
    DictatorDetail(String),
    Profile,
    CreateProfile,
    NotFound,
}

impl Route {
    /// Match a path, ignoring query, fragment and trailing slashes
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Self::Home,
            _ if trimmed == ROUTE_DICTATORS => Self::Dictators,
            _ if trimmed == ROUTE_PROFILE => Self::Profile,
            _ if trimmed == ROUTE_CREATE_PROFILE => Self::CreateProfile,
            _ => match trimmed.strip_prefix(ROUTE_DICTATORS).and_then(|rest| rest.strip_prefix('/'))
            {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Self::DictatorDetail(id.to_string())
                }
                _ => Self::NotFound,
            },
        }
    }

    /// Path of this route; `NotFound` has none of its own
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home | Self::NotFound => ROUTE_HOME.to_string(),
            Self::Dictators => ROUTE_DICTATORS.to_string(),
            Self::DictatorDetail(id) => format!("{ROUTE_DICTATORS}/{id}"),
            Self::Profile => ROUTE_PROFILE.to_string(),
            Self::CreateProfile => ROUTE_CREATE_PROFILE.to_string(),
        }
    }

    /// Routes gated on an authenticated session
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Profile | Self::CreateProfile)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not-found"),
            other => f.write_str(&other.path()),
        }
    }
}

/// What to do with a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    /// Session has not settled; show a loading view
    Loading,
    Redirect(Route),
}

/// Decide whether `route` may render for `session`
///
/// Unauthenticated access to a protected route redirects home without an
/// error; messaging is left to the page.
#[must_use]
pub fn guard(route: &Route, session: &SessionState) -> RouteDecision {
    if !route.requires_auth() {
        return RouteDecision::Render;
    }
    if session.is_loading {
        return RouteDecision::Loading;
    }
    if session.is_authenticated {
        RouteDecision::Render
    } else {
        RouteDecision::Redirect(Route::Home)
    }
}
