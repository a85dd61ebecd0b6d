//! CLI command implementations.

pub(crate) mod attributes;
pub(crate) mod listen;

pub(crate) use attributes::AttributesArgs;
pub(crate) use listen::ListenArgs;
