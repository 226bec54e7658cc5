//! Value representation for an elaborator's normaliser: weak head normal
//! forms, closures and environments, reduction policies, and the analysis of
//! which metavariables block a stuck value.

pub mod cons_list;
pub mod kernel;
