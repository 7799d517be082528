// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod assets;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod constants;
pub mod error;
pub mod install;
pub mod kubernetes;
pub mod olm;
pub mod types;

#[cfg(test)]
pub mod test_utils;
