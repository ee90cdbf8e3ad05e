//! Domain logic: pure types and rules shared by route handlers.

pub mod cart;
pub mod coupon;
pub mod membership;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod returns;
