//! Types for interpreting DOGE-20 token inscriptions: exact decimal amounts,
//! inscription content and the transfer kinds derived from an inscription's
//! history.

use {
  derive_more::Display,
  regex::Regex,
  serde::{Deserialize, Serialize},
  serde_json::Value,
  serde_with::{DeserializeFromStr, SerializeDisplay},
  std::{
    fmt::{self, Formatter},
    str::FromStr,
    sync::LazyLock,
  },
  thiserror::Error,
};

pub use {
  decimal::{Decimal, DecimalError},
  operation::{Op, Operation},
  transfer_kind::{TransferKind, UnknownTransferKind},
};

/// Longest numeric literal the protocol accepts for `max`, `lim` and `amt`.
pub const MAX_LITERAL_LENGTH: usize = 20;

pub const DEFAULT_PROTOCOL: &str = "drc-20";

mod decimal;
mod operation;
mod transfer_kind;
