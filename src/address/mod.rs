//! Email addresses

pub use self::{
    envelope::Envelope,
    types::{Address, AddressError},
};
pub(crate) use self::types::strip_comment;

mod envelope;
mod types;
