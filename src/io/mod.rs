//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `feed` - HTTP client and poll task for the remote alert feed
//! - `notify` - Typed channel to the platform notification boundary
//! - `permission` - Notification permission negotiation
//! - `api` - Local control/display HTTP API

pub mod api;
pub mod feed;
pub mod notify;
pub mod permission;

// Re-export commonly used types
pub use feed::{FeedClient, FeedError, FeedPoller};
pub use notify::{create_notification_channel, NotificationRequest, NotificationSender};
pub use permission::{PermissionGate, PermissionState, SharedPermission};
