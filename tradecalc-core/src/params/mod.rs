//! URL-parameter-backed state.
//!
//! - `codec`: tagged string codecs, one per parameter
//! - `store`: the `ParamStore` capability and its in-memory `LocationStore`
//! - `cell`: `ParamCell`, a value mirrored into one query-string key

pub mod cell;
pub mod codec;
pub mod store;

pub use cell::ParamCell;
pub use codec::{BoolCodec, Codec, CodecKind, JsonCodec, ListCodec, NumberCodec, OptionalCodec, TextCodec};
pub use store::{
    Listener, LocationStore, NavigationEvent, NavigationKind, ParamStore, SubscriptionId, LOCAL_BASE,
};
