// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

//! Cuts a SUMO road network and its route files down to the junctions inside
//! a bounding box, keeping every surviving reference resolvable.

pub mod bbox;
pub mod config;
pub mod document;
pub mod errors;
pub mod pipeline;
pub mod propagation;
pub mod pruning;
pub mod route_filter;

#[cfg(test)]
mod test_pipeline;

pub use bbox::BoundingBox;
pub use config::SubnetConfig;
pub use errors::{ConsistencyError, DanglingReference, EntityClass, FormatError, SubnetError};
pub use pipeline::{SubnetOutput, run};
