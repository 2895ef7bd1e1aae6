// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all external-system adapters implement.

use async_trait::async_trait;

use crate::error::NsxbotError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and lifecycle shared by every adapter.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, NsxbotError>;

    /// Releases any held resources.
    async fn shutdown(&self) -> Result<(), NsxbotError> {
        Ok(())
    }
}
