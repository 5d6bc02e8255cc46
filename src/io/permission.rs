//! Notification permission boundary
//!
//! Tri-state permission mirroring the platform notification model:
//! granted, denied, or not yet determined. The dispatcher queries lazily and
//! requests at most once per undetermined state.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Undetermined => "undetermined",
        }
    }
}

/// Platform permission negotiation seam.
///
/// `request` is only meaningful while the state is undetermined; an
/// implementation may resolve it either way or leave it undetermined
/// (prompt dismissed).
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn state(&self) -> PermissionState;
    async fn request(&self) -> PermissionState;
}

/// Process-local permission gate.
///
/// Starts from a configured state; `request` resolves an undetermined state
/// to the configured outcome. `set` models an external change (user flipping
/// the setting), after which the engine is told via a permission-changed
/// event.
pub struct SharedPermission {
    state: RwLock<PermissionState>,
    on_request: PermissionState,
}

impl SharedPermission {
    pub fn new(initial: PermissionState, on_request: PermissionState) -> Self {
        Self { state: RwLock::new(initial), on_request }
    }

    /// Externally override the permission state
    pub fn set(&self, state: PermissionState) {
        *self.state.write() = state;
    }
}

#[async_trait]
impl PermissionGate for SharedPermission {
    async fn state(&self) -> PermissionState {
        *self.state.read()
    }

    async fn request(&self) -> PermissionState {
        let mut guard = self.state.write();
        if *guard == PermissionState::Undetermined {
            *guard = self.on_request;
        }
        *guard
    }
}
