//! Coupon application service and persistence for the rebate promotion engine.

pub mod context;
pub mod database;
pub mod domain;
pub mod offline;
pub mod receipt;
pub mod uuids;

#[cfg(test)]
mod test;
