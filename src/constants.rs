// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group served by the YAKS CRDs
pub const GROUP: &str = "yaks.citrusframework.org";
/// Version of the YAKS CRDs
pub const VERSION: &str = "v1alpha1";

/// Label keys used by YAKS resources
pub mod labels {
    /// Set on resources created for a test, value is the test name
    pub const TEST: &str = "yaks.citrusframework.org/test";
    /// Set on resources created for a test run, value is the test ID
    pub const TEST_ID: &str = "yaks.citrusframework.org/test-id";
    /// Namespace of the operator responsible for a test
    pub const OPERATOR: &str = "yaks.citrusframework.org/operator";
    pub const COMPONENT: &str = "yaks.citrusframework.org/component";

    /// Selector matching everything installed by YAKS
    pub const DEFAULT_APP_SELECTOR: &str = "app=yaks";
}

/// Name of the aggregated cluster role granting edit rights on YAKS resources
pub const USER_CLUSTER_ROLE: &str = "yaks-edit";

/// Field manager name for writes
pub const FIELD_MANAGER: &str = "yaks";

/// CRD polling configuration
pub mod crd {
    /// Interval between CRD discovery checks
    pub const POLL_INTERVAL_SECS: u64 = 2;
    /// Default deadline for all CRDs to show up in discovery
    pub const WAIT_TIMEOUT_SECS: u64 = 25;
}

/// Operator Lifecycle Manager defaults
pub mod olm {
    pub const OPERATOR_NAME: &str = "yaks-operator";
    pub const PACKAGE: &str = "yaks";
    /// Distribution channel in Operator Hub
    pub const CHANNEL: &str = "alpha";
    pub const SOURCE: &str = "community-operators";
    pub const SOURCE_NAMESPACE: &str = "openshift-marketplace";
    pub const STARTING_CSV: &str = "";
    /// Namespace holding an OperatorGroup that watches all namespaces
    pub const GLOBAL_NAMESPACE: &str = "openshift-operators";
}
