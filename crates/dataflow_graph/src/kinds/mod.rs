// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete node kinds.

pub mod add;
pub mod constant;
pub mod domain_flow;

pub use add::Add;
pub use constant::Constant;
pub use domain_flow::DomainFlow;
