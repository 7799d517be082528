// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator installation through the Operator Lifecycle Manager.

pub mod operator;

pub use operator::{
    has_permission_to_install, install, is_operator_installed, parse_env_vars, uninstall,
    OlmOptions,
};
