//! ============================================================================
//! Access Module - Role-scoped routing for the client shell
//! ============================================================================
//! Maps client paths to views and decides, from the current session, whether
//! a view renders or the user is sent elsewhere.
//!
//! ## Outcomes
//! - **Render**: public route, or the session holds an allowed role
//! - **Redirect `/login`**: role-scoped route without a session
//! - **Redirect `/`**: signed in with the wrong role, or unknown path
//! - **Redirect `/admin/login`**: admin route without an admin session, or
//!   with KYC pending/rejected
//!
//! ## Usage
//! ```rust,ignore
//! use agri_core::access::{decide, GuardDecision};
//!
//! match decide("/farmer/batches", &session_state) {
//!     GuardDecision::Render(route) => show(route.view()),
//!     GuardDecision::Redirect(target) => navigator.navigate(&target),
//!     GuardDecision::Pending => spinner(),
//! }
//! ```
//! ============================================================================

mod guard;
mod navigator;
mod routes;

pub use guard::{decide, GuardDecision, RouteGuard, ADMIN_LOGIN_PATH, HOME_PATH, LOGIN_PATH};
pub use navigator::{Navigator, RecordingNavigator};
pub use routes::{
    alias_target, match_route, menu_for, normalize_path, MenuItem, RouteAccess, RouteDef,
    RouteMatch, View, MENUS, ROUTES,
};
