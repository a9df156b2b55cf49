//! Read-side queries over the university catalog.
//!
//! Provides the preference-driven wizard ([`wizard::recommend`]) and categorical
//! frequency counts ([`insights::insights`]).

pub mod insights;
pub mod wizard;
