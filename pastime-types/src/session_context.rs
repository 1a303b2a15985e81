use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the authenticated actor making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: Uuid,
    pub email: String,
}

/// Per-request session state supplied by the session layer.
///
/// Route handlers treat this as read-only input; creating and destroying
/// sessions is the session manager's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub is_logged_in: bool,
    pub viewer: Option<Viewer>,
}

impl SessionContext {
    /// Context for a request carrying a valid session
    pub fn logged_in(viewer: Viewer) -> Self {
        Self {
            is_logged_in: true,
            viewer: Some(viewer),
        }
    }

    /// Context for a request without a (valid) session
    pub fn anonymous() -> Self {
        Self {
            is_logged_in: false,
            viewer: None,
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
