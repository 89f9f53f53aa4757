//! ============================================================================
//! Route Table - Client paths, the views they render, and who may see them
//! ============================================================================
//! Dispatch is table-driven: adding a page means adding a row here, never a
//! new branch in the guard.
//! ============================================================================

use crate::types::Role;

/// Who may open a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone, signed in or not
    Public,
    /// Any signed-in user
    Authenticated,
    /// Signed-in users holding one of these roles
    Roles(&'static [Role]),
    /// Admin area: admin role and no pending or rejected KYC
    Admin,
}

/// Screen rendered for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Landing,
    RoleSelection,
    Login,
    Register,
    KycPending,
    KycRejected,
    AdminLogin,
    Trace,
    Profile,
    FarmerDashboard,
    FarmerBatches,
    DistributorDashboard,
    DistributorInventory,
    DistributorIncoming,
    DistributorOutgoing,
    DistributorInspection,
    TransporterDashboard,
    TransporterFarmerShipments,
    TransporterDistributorShipments,
    TransporterInTransit,
    TransporterCompleted,
    RetailerDashboard,
    RetailerReceived,
    RetailerListed,
    RetailerSold,
    RetailerNewListing,
    ConsumerDashboard,
    AdminDashboard,
    AdminKyc,
    AdminUsers,
}

/// One row of the route table. `:name` segments capture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDef {
    pub pattern: &'static str,
    pub access: RouteAccess,
    pub view: View,
}

const FARMER: &[Role] = &[Role::Farmer];
const DISTRIBUTOR: &[Role] = &[Role::Distributor];
const TRANSPORTER: &[Role] = &[Role::Transporter];
const RETAILER: &[Role] = &[Role::Retailer];
const CONSUMER: &[Role] = &[Role::Consumer];

const fn route(pattern: &'static str, access: RouteAccess, view: View) -> RouteDef {
    RouteDef { pattern, access, view }
}

/// Every client-visible route
pub const ROUTES: &[RouteDef] = &[
    // Public
    route("/", RouteAccess::Public, View::Landing),
    route("/role-selection", RouteAccess::Public, View::RoleSelection),
    route("/login", RouteAccess::Public, View::Login),
    route("/register/:role", RouteAccess::Public, View::Register),
    route("/kyc-pending", RouteAccess::Public, View::KycPending),
    route("/kyc-rejected", RouteAccess::Public, View::KycRejected),
    route("/admin/login", RouteAccess::Public, View::AdminLogin),
    route("/trace/:publicId", RouteAccess::Public, View::Trace),
    route("/consumer/trace", RouteAccess::Public, View::Trace),
    // Any signed-in role
    route("/profile", RouteAccess::Authenticated, View::Profile),
    // Farmer
    route("/farmer/dashboard", RouteAccess::Roles(FARMER), View::FarmerDashboard),
    route("/farmer/batches", RouteAccess::Roles(FARMER), View::FarmerBatches),
    // Distributor
    route("/distributor/dashboard", RouteAccess::Roles(DISTRIBUTOR), View::DistributorDashboard),
    route("/distributor/inventory", RouteAccess::Roles(DISTRIBUTOR), View::DistributorInventory),
    route("/distributor/incoming", RouteAccess::Roles(DISTRIBUTOR), View::DistributorIncoming),
    route("/distributor/outgoing", RouteAccess::Roles(DISTRIBUTOR), View::DistributorOutgoing),
    route("/distributor/inspection/:id", RouteAccess::Roles(DISTRIBUTOR), View::DistributorInspection),
    // Transporter
    route("/transporter/dashboard", RouteAccess::Roles(TRANSPORTER), View::TransporterDashboard),
    route("/transporter/farmer-shipments", RouteAccess::Roles(TRANSPORTER), View::TransporterFarmerShipments),
    route("/transporter/distributor-shipments", RouteAccess::Roles(TRANSPORTER), View::TransporterDistributorShipments),
    route("/transporter/in-transit", RouteAccess::Roles(TRANSPORTER), View::TransporterInTransit),
    route("/transporter/completed", RouteAccess::Roles(TRANSPORTER), View::TransporterCompleted),
    // Retailer
    route("/retailer/dashboard", RouteAccess::Roles(RETAILER), View::RetailerDashboard),
    route("/retailer/received", RouteAccess::Roles(RETAILER), View::RetailerReceived),
    route("/retailer/listed", RouteAccess::Roles(RETAILER), View::RetailerListed),
    route("/retailer/sold", RouteAccess::Roles(RETAILER), View::RetailerSold),
    route("/retailer/listing/new", RouteAccess::Roles(RETAILER), View::RetailerNewListing),
    // Consumer
    route("/consumer/dashboard", RouteAccess::Roles(CONSUMER), View::ConsumerDashboard),
    // Admin
    route("/admin/dashboard", RouteAccess::Admin, View::AdminDashboard),
    route("/admin/kyc", RouteAccess::Admin, View::AdminKyc),
    route("/admin/users", RouteAccess::Admin, View::AdminUsers),
];

/// Paths that are plain redirects (index routes)
pub const ALIASES: &[(&str, &str)] = &[("/admin", "/admin/dashboard")];

/// A resolved route with its captured parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub route: &'static RouteDef,
    pub path: String,
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn view(&self) -> View {
        self.route.view
    }
}

/// Strip query/fragment and trailing slash; keep `/` for the root
pub fn normalize_path(path: &str) -> String {
    let without_query = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = without_query.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let pattern_segments: Vec<&'static str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (expected, actual) in pattern_segments.iter().zip(path_segments.iter()) {
        if let Some(name) = expected.strip_prefix(':') {
            params.push((name, actual.to_string()));
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

/// Find the route for a path, if any
pub fn match_route(path: &str) -> Option<RouteMatch> {
    let normalized = normalize_path(path);
    ROUTES.iter().find_map(|route| {
        match_pattern(route.pattern, &normalized).map(|params| RouteMatch {
            route,
            path: normalized.clone(),
            params,
        })
    })
}

/// Redirect target for index-style paths
pub fn alias_target(path: &str) -> Option<&'static str> {
    let normalized = normalize_path(path);
    ALIASES
        .iter()
        .find(|(from, _)| *from == normalized)
        .map(|(_, to)| *to)
}

// ============================================================================
// Sidebar Menus
// ============================================================================

/// Sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub path: &'static str,
    pub label: &'static str,
}

const fn item(path: &'static str, label: &'static str) -> MenuItem {
    MenuItem { path, label }
}

/// Role → sidebar entries
pub const MENUS: &[(Role, &[MenuItem])] = &[
    (
        Role::Admin,
        &[
            item("/admin/dashboard", "Dashboard"),
            item("/admin/kyc", "KYC Requests"),
            item("/admin/users", "Users"),
        ],
    ),
    (
        Role::Farmer,
        &[
            item("/farmer/dashboard", "Dashboard"),
            item("/farmer/batches", "My Batches"),
        ],
    ),
    (
        Role::Distributor,
        &[
            item("/distributor/dashboard", "Dashboard"),
            item("/distributor/incoming", "Incoming"),
            item("/distributor/inventory", "Inventory"),
            item("/distributor/outgoing", "Outgoing"),
        ],
    ),
    (
        Role::Transporter,
        &[
            item("/transporter/dashboard", "Dashboard"),
            item("/transporter/farmer-shipments", "Farmer Shipments"),
            item("/transporter/distributor-shipments", "Distributor Shipments"),
            item("/transporter/in-transit", "In Transit"),
            item("/transporter/completed", "Completed"),
        ],
    ),
    (
        Role::Retailer,
        &[
            item("/retailer/dashboard", "Dashboard"),
            item("/retailer/received", "Received"),
            item("/retailer/listed", "Listed"),
            item("/retailer/sold", "Sold"),
            item("/retailer/listing/new", "New Listing"),
        ],
    ),
    (
        Role::Consumer,
        &[item("/consumer/dashboard", "Dashboard")],
    ),
];

/// Sidebar entries for a role (empty when signed out)
pub fn menu_for(role: Option<Role>) -> &'static [MenuItem] {
    role.and_then(|role| {
        MENUS
            .iter()
            .find(|(menu_role, _)| *menu_role == role)
            .map(|(_, items)| *items)
    })
    .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/farmer/dashboard/"), "/farmer/dashboard");
        assert_eq!(normalize_path("farmer/dashboard?tab=1"), "/farmer/dashboard");
    }

    #[test]
    fn test_param_capture() {
        let matched = match_route("/trace/PB-2024-0001").unwrap();
        assert_eq!(matched.view(), View::Trace);
        assert_eq!(matched.param("publicId"), Some("PB-2024-0001"));

        let matched = match_route("/distributor/inspection/42/").unwrap();
        assert_eq!(matched.view(), View::DistributorInspection);
        assert_eq!(matched.param("id"), Some("42"));
    }

    #[test]
    fn test_unknown_path() {
        assert!(match_route("/farmer/unknown").is_none());
        assert!(match_route("/trace").is_none());
    }

    #[test]
    fn test_every_role_has_a_dashboard_route() {
        for role in Role::ALL {
            let matched = match_route(&role.dashboard_path())
                .unwrap_or_else(|| panic!("missing dashboard for {}", role));
            match matched.route.access {
                RouteAccess::Roles(roles) => assert_eq!(roles, &[role]),
                RouteAccess::Admin => assert_eq!(role, Role::Admin),
                other => panic!("dashboard for {} is {:?}", role, other),
            }
        }
    }

    #[test]
    fn test_menus_point_at_known_routes() {
        for (role, items) in MENUS {
            assert_eq!(items[0].path, role.dashboard_path());
            for entry in *items {
                assert!(match_route(entry.path).is_some(), "{} has no route", entry.path);
            }
        }
        assert!(menu_for(None).is_empty());
        assert_eq!(menu_for(Some(Role::Retailer)).len(), 5);
    }

    #[test]
    fn test_admin_alias() {
        assert_eq!(alias_target("/admin/"), Some("/admin/dashboard"));
        assert_eq!(alias_target("/admin/kyc"), None);
    }
}
