// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` impl mapping enum variants to string literals
//! - [`setters!`] — non-mutating `with_*` methods for immutable value types

/// Generate a `Display` impl that maps enum variants to string literals.
///
/// Unit variants match directly; data-carrying variants use `(..)` to ignore fields.
///
/// ```ignore
/// crate::simple_display! {
///     BackendKind {
///         Local => "local",
///         Remote => "remote",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Generate `with_*` methods inside an existing `impl` block.
///
/// Each method takes `&self`, clones, and returns the modified copy, so the
/// receiver is never mutated. This is how contexts and commands are derived
/// from one another.
///
/// Field groups:
/// - `into { field: Type }` — setter takes `impl Into<Type>`
/// - `set { field: Type }` — setter takes `Type` directly
/// - `option { field: Type }` — field is `Option<Type>`, setter wraps in `Some`
///
/// ```ignore
/// impl CommandContext {
///     cmdx_core::setters! {
///         set { dry_run: bool }
///         option { timeout: Duration }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into {
            $( $into_method:ident => $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_method:ident => $set_field:ident : $set_ty:ty ),* $(,)?
        })?
        $(option {
            $( $opt_method:ident => $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            #[must_use]
            pub fn $into_method(&self, v: impl Into<$into_ty>) -> Self {
                let mut next = self.clone();
                next.$into_field = v.into();
                next
            }
        )*)?

        $($(
            #[must_use]
            pub fn $set_method(&self, v: $set_ty) -> Self {
                let mut next = self.clone();
                next.$set_field = v;
                next
            }
        )*)?

        $($(
            #[must_use]
            pub fn $opt_method(&self, v: impl Into<$opt_ty>) -> Self {
                let mut next = self.clone();
                next.$opt_field = Some(v.into());
                next
            }
        )*)?
    };
}
