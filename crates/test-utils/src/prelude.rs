//! Commonly used test helpers.

pub use crate::{
    arbitrary_generator::{random_account, random_address, random_hash, random_u256},
    scripted::{returns, script_call, script_effect, CallScript},
};
