//! CLI command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod load;
pub(crate) mod ls;
pub(crate) mod run;
pub(crate) mod setup;
pub(crate) mod stage;
