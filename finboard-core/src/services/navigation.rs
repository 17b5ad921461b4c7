//! Page routes and the privilege-filtered navigation menu

use std::fmt;

use serde::Serialize;

use crate::domain::{PrivilegeKey, PrivilegeSet};

/// Every page of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Login,
    Dashboard,
    AddIncome,
    AddExpense,
    Reports,
    Bills,
    Downloads,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Dashboard,
        Route::AddIncome,
        Route::AddExpense,
        Route::Reports,
        Route::Bills,
        Route::Downloads,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::AddIncome => "/add-income",
            Route::AddExpense => "/add-expense",
            Route::Reports => "/reports",
            Route::Bills => "/bills",
            Route::Downloads => "/downloads",
        }
    }

    /// Exact path match
    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|route| route.path() == path)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::AddIncome => "Add Income",
            Route::AddExpense => "Add Expense",
            Route::Reports => "Reports",
            Route::Bills => "Bills",
            Route::Downloads => "Downloads",
        }
    }

    /// Privilege needed to open the page, if any
    pub fn required_privilege(&self) -> Option<PrivilegeKey> {
        match self {
            Route::Login | Route::Dashboard => None,
            Route::AddIncome => Some(PrivilegeKey::AddIncome),
            Route::AddExpense => Some(PrivilegeKey::AddExpense),
            Route::Reports => Some(PrivilegeKey::ViewReports),
            Route::Bills => Some(PrivilegeKey::UploadBills),
            Route::Downloads => Some(PrivilegeKey::DownloadReports),
        }
    }

    /// Whether the route guard protects this page
    pub fn is_protected(&self) -> bool {
        *self != Route::Login
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Routes listed in the menu, in display order
pub const NAV_ENTRIES: [Route; 6] = [
    Route::Dashboard,
    Route::AddIncome,
    Route::AddExpense,
    Route::Reports,
    Route::Bills,
    Route::Downloads,
];

/// One visible menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Whether `route` may be shown under `privileges`.
///
/// Unkeyed routes are always allowed. Absent privileges (still loading)
/// allow every keyed route so the menu does not flash empty.
pub fn can_access(route: Route, privileges: Option<&PrivilegeSet>) -> bool {
    match (route.required_privilege(), privileges) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(key), Some(set)) => set.allows(key),
    }
}

/// Menu entries visible under `privileges`, with the one matching
/// `current_path` exactly marked active.
pub fn visible_entries(current_path: &str, privileges: Option<&PrivilegeSet>) -> Vec<NavItem> {
    NAV_ENTRIES
        .into_iter()
        .filter(|route| can_access(*route, privileges))
        .map(|route| NavItem {
            route,
            label: route.title(),
            path: route.path(),
            active: route.path() == current_path,
        })
        .collect()
}
