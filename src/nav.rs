//! Navigation bar shown above every page.

use crate::gate::Access;
use crate::router::{PROFILE_PATH, USER_MANAGEMENT_PATH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Path(&'static str),
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub target: NavTarget,
}

/// Links for the current session. The management link follows the role
/// alone, so a stored admin role without a token still shows it.
pub fn links(access: Access) -> Vec<NavLink> {
    let mut links = Vec::new();
    if !access.authenticated {
        links.push(NavLink {
            label: "User Management Portal",
            target: NavTarget::Path("/"),
        });
    }
    if access.authenticated {
        links.push(NavLink {
            label: "Profile",
            target: NavTarget::Path(PROFILE_PATH),
        });
    }
    if access.admin {
        links.push(NavLink {
            label: "User Management",
            target: NavTarget::Path(USER_MANAGEMENT_PATH),
        });
    }
    if access.authenticated {
        links.push(NavLink {
            label: "Logout",
            target: NavTarget::Logout,
        });
    }
    links
}

pub fn render(access: Access) -> String {
    links(access)
        .iter()
        .map(|link| match &link.target {
            NavTarget::Path(path) => format!("[{}]({})", link.label, path),
            NavTarget::Logout => format!("[{}](/logout)", link.label),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn footer(year: i32) -> String {
    format!("User Management Portal | All Rights Reserved (c) {}", year)
}
