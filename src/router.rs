//! Path to page routing.
//!
//! A [`RouteTable`] is built from one gate evaluation and then stays fixed.
//! It only changes when the console rebuilds it on reload, so a session that
//! gains admin rights mid-way keeps the old table until then.

use crate::gate::Access;

pub const LOGIN_PATH: &str = "/login";
pub const PROFILE_PATH: &str = "/profile";
pub const REGISTER_PATH: &str = "/register";
pub const USER_MANAGEMENT_PATH: &str = "/admin/user-management";
const UPDATE_USER_PREFIX: &str = "/update-user/";

pub fn update_user_path(user_id: &str) -> String {
    format!("{}{}", UPDATE_USER_PREFIX, user_id)
}

/// A page the router can hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Profile,
    Register,
    UserManagement,
    UpdateUser { user_id: String },
}

impl Route {
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Route::Register | Route::UserManagement | Route::UpdateUser { .. }
        )
    }
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Page(Route),
    Redirect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Exact(&'static str),
    UpdateUser,
}

#[derive(Debug, Clone)]
struct Entry {
    pattern: Pattern,
    route: Route,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<Entry>,
}

impl RouteTable {
    pub fn build(access: Access) -> Self {
        let mut entries = vec![
            Entry {
                pattern: Pattern::Exact("/"),
                route: Route::Login,
            },
            Entry {
                pattern: Pattern::Exact(LOGIN_PATH),
                route: Route::Login,
            },
            Entry {
                pattern: Pattern::Exact(PROFILE_PATH),
                route: Route::Profile,
            },
        ];

        if access.admin_only() {
            entries.push(Entry {
                pattern: Pattern::Exact(REGISTER_PATH),
                route: Route::Register,
            });
            entries.push(Entry {
                pattern: Pattern::Exact(USER_MANAGEMENT_PATH),
                route: Route::UserManagement,
            });
            entries.push(Entry {
                pattern: Pattern::UpdateUser,
                route: Route::UpdateUser {
                    user_id: String::new(),
                },
            });
        }

        Self { entries }
    }

    pub fn has_admin_routes(&self) -> bool {
        self.entries.iter().any(|e| e.route.is_admin_only())
    }

    pub fn resolve(&self, path: &str) -> Resolution {
        let path = normalize(path);
        for entry in &self.entries {
            match entry.pattern {
                Pattern::Exact(p) if p == path => return Resolution::Page(entry.route.clone()),
                Pattern::UpdateUser => {
                    if let Some(id) = path.strip_prefix(UPDATE_USER_PREFIX) {
                        if is_user_id_segment(id) {
                            return Resolution::Page(Route::UpdateUser {
                                user_id: id.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        Resolution::Redirect(LOGIN_PATH.to_string())
    }
}

/// One non-empty path segment that is not a dot segment.
fn is_user_id_segment(id: &str) -> bool {
    !id.is_empty() && !id.contains('/') && id != "." && id != ".."
}

/// Drop query, fragment and trailing slash; ensure a leading slash.
pub fn normalize(path: &str) -> String {
    let path = path.trim();
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
