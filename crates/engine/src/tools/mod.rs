// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in tool declarations and their command builders.

pub mod df;
pub mod ls;
pub mod ps;
