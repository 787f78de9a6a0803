//! Terraform plan viewer with a guarded confirmation step.
//!
//! plantree reads `terraform plan` (or `apply`/`destroy`) output, echoes it
//! unchanged, and shows the planned changes as a collapsible tree. When the
//! wrapped command asks for confirmation, the answer can only be given
//! through a dialog whose confirm button moves on every opening.
//!
//! - **[`core`]**: Pure logic (line classification, tree building, color
//!   markup, dialog layout). No I/O.
//! - **[`io`]**: Side effects (child process, output tee, configuration).
//!
//! [`session`] ties both together behind the [`session::Frontend`] seam;
//! [`ui`] is the terminal frontend.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod ui;
