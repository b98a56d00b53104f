//! NutriNana onboarding core.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod remote;
