// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types read and written by the client.

pub mod instance;
pub mod olm;

pub use instance::{Instance, InstanceSpec, InstanceStatus, OperatorSpec};
pub use test::{SourceSpec, Test, TestSpec, TestStatus};
