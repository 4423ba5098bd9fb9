//! Sector access guard
//!
//! Gates sector-scoped admin pages on the caller's resolved role and the
//! sector embedded in the requested path. The decision half is pure; the
//! resolution half looks up the caller's assigned sector (Redis-cached)
//! and is protected by a per-instance single-flight token so rapid
//! identity/path changes cannot interleave two resolutions.

use parking_lot::Mutex;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AdminIdentity;
use crate::domain::sectors::normalize_sector_name;
use crate::services::{cache_keys, RedisCache};

/// Where unauthenticated callers are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Terminal guard outcome for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GuardDecision {
    Authorized,
    RedirectToLogin { location: String },
    RedirectToSector { location: String },
    /// Sector resolution failed or no sector is assigned; render nothing,
    /// no automatic retry.
    Unresolved,
    /// Another resolution for this guard instance is still running.
    InFlight,
}

/// The slice of an identity the decision function needs.
#[derive(Debug, Clone)]
pub struct GuardSubject {
    pub is_superadmin: bool,
    pub sector_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectorPageKind {
    Dashboard,
    MsmeList,
}

impl SectorPageKind {
    fn path_for(self, sector_key: &str) -> String {
        match self {
            Self::Dashboard => format!("/admin/dashboard/{}", sector_key),
            Self::MsmeList => format!("/admin/msme/{}", sector_key),
        }
    }
}

enum PathKind<'a> {
    /// Editing a specific record is not sector-gated.
    EditMsme,
    SectorScoped {
        kind: SectorPageKind,
        segment: &'a str,
    },
    Other,
}

fn classify_path(path: &str) -> PathKind<'_> {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["admin", "msme", "edit", _id] => PathKind::EditMsme,
        ["admin", "dashboard", sector] => PathKind::SectorScoped {
            kind: SectorPageKind::Dashboard,
            segment: sector,
        },
        ["admin", "msme", sector] => PathKind::SectorScoped {
            kind: SectorPageKind::MsmeList,
            segment: sector,
        },
        _ => PathKind::Other,
    }
}

/// Pure guard decision over a resolved subject and the requested path.
pub fn decide(subject: Option<&GuardSubject>, path: &str) -> GuardDecision {
    let Some(subject) = subject else {
        return GuardDecision::RedirectToLogin {
            location: LOGIN_PATH.to_string(),
        };
    };

    // Superadmin is always authorized, no further checks
    if subject.is_superadmin {
        return GuardDecision::Authorized;
    }

    match classify_path(path) {
        PathKind::EditMsme | PathKind::Other => GuardDecision::Authorized,
        PathKind::SectorScoped { kind, segment } => {
            let Some(own_sector) = subject.sector_name.as_deref() else {
                return GuardDecision::Unresolved;
            };

            let own_key = normalize_sector_name(own_sector);
            if normalize_sector_name(segment) == own_key {
                GuardDecision::Authorized
            } else {
                GuardDecision::RedirectToSector {
                    location: kind.path_for(&own_key),
                }
            }
        }
    }
}

/// Per-identity guard instance carrying the single-flight flag.
#[derive(Debug, Default)]
pub struct SectorGuard {
    in_flight: AtomicBool,
}

/// RAII token marking a resolution as in flight.
pub struct CheckToken<'a> {
    guard: &'a SectorGuard,
}

impl Drop for CheckToken<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

impl SectorGuard {
    /// Try to start a resolution. Returns `None` while another check on
    /// this instance is still in flight.
    pub fn try_begin(&self) -> Option<CheckToken<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()?;
        Some(CheckToken { guard: self })
    }

    /// Evaluate the guard for an identity and path, resolving the assigned
    /// sector when needed.
    pub async fn evaluate(
        &self,
        db: &PgPool,
        cache: &RedisCache,
        identity: Option<&AdminIdentity>,
        path: &str,
    ) -> GuardDecision {
        let Some(identity) = identity else {
            return decide(None, path);
        };

        // Superadmins never need a sector resolution
        if identity.is_superadmin {
            return GuardDecision::Authorized;
        }

        let Some(_token) = self.try_begin() else {
            tracing::debug!(admin_id = %identity.id, "Guard check already in flight");
            return GuardDecision::InFlight;
        };

        let sector_name = match resolve_assigned_sector(db, cache, identity.id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(admin_id = %identity.id, error = %e, "Sector resolution failed");
                return GuardDecision::Unresolved;
            }
        };

        let subject = GuardSubject {
            is_superadmin: false,
            sector_name,
        };

        decide(Some(&subject), path)
    }
}

/// Look up the admin's assigned sector name, consulting Redis first.
///
/// Admins with multiple assignments route to the alphabetically first
/// sector, matching the listing order of the admin panel.
async fn resolve_assigned_sector(
    db: &PgPool,
    cache: &RedisCache,
    admin_id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    let key = cache_keys::guard_sector(admin_id);
    if let Some(name) = cache.get::<String>(&key).await {
        return Ok(Some(name));
    }

    let name: Option<String> = sqlx::query_scalar(
        r#"
        SELECT s.name
        FROM admin_sectors a
        JOIN sectors s ON s.id = a.sector_id
        WHERE a.admin_id = $1
        ORDER BY s.name
        LIMIT 1
        "#,
    )
    .bind(admin_id)
    .fetch_optional(db)
    .await?;

    if let Some(ref name) = name {
        if let Err(e) = cache.set(&key, name).await {
            tracing::warn!(admin_id = %admin_id, error = %e, "Failed to cache assigned sector");
        }
    }

    Ok(name)
}

/// One guard instance per admin identity, created lazily.
#[derive(Debug, Default)]
pub struct GuardRegistry {
    guards: Mutex<HashMap<Uuid, Arc<SectorGuard>>>,
}

impl GuardRegistry {
    pub fn guard_for(&self, admin_id: Uuid) -> Arc<SectorGuard> {
        self.guards
            .lock()
            .entry(admin_id)
            .or_insert_with(|| Arc::new(SectorGuard::default()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_in(sector: &str) -> GuardSubject {
        GuardSubject {
            is_superadmin: false,
            sector_name: Some(sector.to_string()),
        }
    }

    fn superadmin() -> GuardSubject {
        GuardSubject {
            is_superadmin: true,
            sector_name: None,
        }
    }

    #[test]
    fn missing_identity_redirects_to_login() {
        assert_eq!(
            decide(None, "/admin/dashboard/coffee"),
            GuardDecision::RedirectToLogin {
                location: "/admin/login".to_string()
            }
        );
    }

    #[test]
    fn superadmin_is_never_redirected() {
        let sa = superadmin();
        for path in [
            "/admin/dashboard/coffee",
            "/admin/msme/bamboo",
            "/admin/dashboard/itbpm",
        ] {
            assert_eq!(decide(Some(&sa), path), GuardDecision::Authorized);
        }
    }

    #[test]
    fn foreign_sector_redirects_to_own_dashboard() {
        let subject = admin_in("Bamboo");
        assert_eq!(
            decide(Some(&subject), "/admin/dashboard/coffee"),
            GuardDecision::RedirectToSector {
                location: "/admin/dashboard/bamboo".to_string()
            }
        );
    }

    #[test]
    fn redirect_preserves_the_page_kind() {
        let subject = admin_in("Bamboo");
        assert_eq!(
            decide(Some(&subject), "/admin/msme/coffee"),
            GuardDecision::RedirectToSector {
                location: "/admin/msme/bamboo".to_string()
            }
        );
    }

    #[test]
    fn own_sector_is_authorized_across_separator_variants() {
        let subject = admin_in("IT-BPM");
        assert_eq!(
            decide(Some(&subject), "/admin/dashboard/it bpm"),
            GuardDecision::Authorized
        );
        assert_eq!(
            decide(Some(&subject), "/admin/dashboard/IT_BPM"),
            GuardDecision::Authorized
        );
    }

    #[test]
    fn editing_by_id_is_not_sector_gated() {
        let subject = admin_in("Bamboo");
        assert_eq!(
            decide(
                Some(&subject),
                "/admin/msme/edit/5bd3f6a0-9f74-4a41-a2c3-0a5ad3a5f6de"
            ),
            GuardDecision::Authorized
        );
    }

    #[test]
    fn non_sector_paths_pass_through() {
        let subject = admin_in("Bamboo");
        assert_eq!(decide(Some(&subject), "/admin/settings"), GuardDecision::Authorized);
    }

    #[test]
    fn query_strings_do_not_affect_classification() {
        let subject = admin_in("Bamboo");
        assert_eq!(
            decide(Some(&subject), "/admin/dashboard/coffee?page=2"),
            GuardDecision::RedirectToSector {
                location: "/admin/dashboard/bamboo".to_string()
            }
        );
    }

    #[test]
    fn unassigned_admin_is_unresolved_on_sector_pages() {
        let subject = GuardSubject {
            is_superadmin: false,
            sector_name: None,
        };
        assert_eq!(
            decide(Some(&subject), "/admin/dashboard/coffee"),
            GuardDecision::Unresolved
        );
    }

    #[test]
    fn single_flight_admits_one_check_at_a_time() {
        let guard = SectorGuard::default();

        let first = guard.try_begin();
        assert!(first.is_some());
        assert!(guard.try_begin().is_none());

        drop(first);
        assert!(guard.try_begin().is_some());
    }
}
