// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Implementations of the `test` and `dump` subcommands.

pub mod dump;

pub use dump::{dump_all, dump_test, DumpOptions};
pub use test::{create_test, load_data, sanitize_file_name, sanitize_name};
