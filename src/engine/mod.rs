//! Engine: scanning, coupon construction, result verification and the
//! daily cycle that ties them together.

pub mod builder;
pub mod cycle;
pub mod scanner;
pub mod verifier;
