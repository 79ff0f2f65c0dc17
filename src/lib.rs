//! Read `.env` files and hand values back with their types inferred.
//!
//! [`EnvStore::open`] loads a file once and never fails: an unreadable or
//! malformed file is recorded and surfaced through [`EnvStore::error`], and
//! every lookup on such a store answers `None`.
//!
//! Values come back as [`Value`]s, either inferred ([`EnvStore::get_all`],
//! [`infer`]) or coerced to a requested [`Kind`] ([`EnvStore::get_as`],
//! [`coerce`]). List, tuple and mapping tokens are read by a restricted
//! literal parser ([`parse_literal`]) that never evaluates anything.

mod env;
mod error;
mod infer;
mod literal;
mod loader;
mod model;
mod parser;
mod value;

pub use env::Environment;
pub use error::{Error, LiteralError, LiteralErrorKind, ParseError, ParseErrorKind, UnknownKind};
pub use infer::{
    DEFAULT_DATETIME_FORMAT, Inference, coerce, coerce_named, infer, is_boolean, is_datetime,
    is_float, is_integer, is_list, is_mapping, is_tuple,
};
pub use literal::{MAX_DEPTH, parse_literal};
pub use loader::{EnvLoader, EnvStore};
pub use model::{Entry, MalformedLines, SubstitutionMode};
pub use parser::{parse_str, parse_str_with_mode};
pub use value::{Kind, Value};
