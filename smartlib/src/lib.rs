//! Hardware-independent part of the SmartBox firmware: switch and station state,
//! query parsing and response rendering. Compiles on the host for tests.

#![cfg_attr(not(test), no_std)]

pub mod api;
pub mod page;
pub mod query;
pub mod report;
pub mod stations;
pub mod switch_state;
pub mod value_synchronizer;
