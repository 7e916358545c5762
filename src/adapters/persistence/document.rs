//! Order Document Codec - JSON Import/Export Format
//!
//! Wire format:
//!
//! ```json
//! {
//!   "takerOrder": { "side": "BUY", "token": "YES", "makerAmount": 100, "takerAmount": 50, "making": 100 },
//!   "makerOrders": [ { "side": "SELL", "token": "YES", "makerAmount": 100, "takerAmount": 5, "making": 100 } ]
//! }
//! ```
//!
//! Older documents carry `tokenId` instead of `token`. The taker's token is
//! then always YES, and a maker is YES when its `tokenId` strictly equals
//! the taker's (same kind, same value), NO otherwise. Amounts may be JSON
//! numbers or numeric strings; anything absent or unparseable reads as
//! zero. Amounts are written back with every decimal digit intact.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::domain::{Order, OrderError, Side, SideToken, Token};
use crate::ports::OrderSet;

/// Why a document could not be imported.
#[derive(Debug, Error)]
pub enum ImportError {
  #[error("error parsing JSON: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error(
    "invalid document: missing \"{0}\" (expected {{ \"takerOrder\": {{...}}, \"makerOrders\": [...] }})"
  )]
  MissingKey(&'static str),
  #[error("{location}: {source}")]
  InvalidOrder {
    location: String,
    #[source]
    source: OrderError,
  },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
  taker_order: Option<RawOrder>,
  maker_orders: Option<Vec<RawOrder>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
  side: Option<String>,
  token: Option<String>,
  token_id: Option<Value>,
  #[serde(default)]
  maker_amount: Value,
  #[serde(default)]
  taker_amount: Value,
  #[serde(default)]
  making: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
  taker_order: WireOrder,
  maker_orders: Vec<WireOrder>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
  side: Side,
  token: Token,
  maker_amount: Number,
  taker_amount: Number,
  making: Number,
}

impl From<&Order> for WireOrder {
  fn from(order: &Order) -> Self {
    Self {
      side: order.side,
      token: order.token,
      maker_amount: to_number(order.maker_amount),
      taker_amount: to_number(order.taker_amount),
      making: to_number(order.making),
    }
  }
}

/// Decode a whole document. Nothing is returned unless every order is valid.
pub fn decode(json: &str) -> Result<OrderSet, ImportError> {
  let raw: RawDocument = serde_json::from_str(json)?;
  let taker_raw = raw.taker_order.ok_or(ImportError::MissingKey("takerOrder"))?;
  let makers_raw = raw.maker_orders.ok_or(ImportError::MissingKey("makerOrders"))?;

  let taker_token = match (&taker_raw.token, &taker_raw.token_id) {
    (Some(token), _) => parse_token(token, "takerOrder")?,
    (None, Some(_)) => Token::Yes,
    (None, None) => return Err(invalid("takerOrder", OrderError::UnknownToken(String::new()))),
  };
  let taker = to_order(&taker_raw, taker_token, "takerOrder")?;

  let makers = makers_raw
    .iter()
    .enumerate()
    .map(|(i, maker)| {
      let location = format!("makerOrders[{i}]");
      let token = match (&maker.token, &maker.token_id, &taker_raw.token_id) {
        (Some(token), _, _) => parse_token(token, &location)?,
        (None, Some(maker_id), Some(taker_id)) => {
          if same_token_id(maker_id, taker_id) {
            Token::Yes
          } else {
            Token::No
          }
        }
        _ => return Err(invalid(&location, OrderError::UnknownToken(String::new()))),
      };
      to_order(maker, token, &location)
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(OrderSet { taker, makers })
}

/// Encode an order set as a pretty-printed document.
pub fn encode(set: &OrderSet) -> Result<String, serde_json::Error> {
  let doc = WireDocument {
    taker_order: WireOrder::from(&set.taker),
    maker_orders: set.makers.iter().map(WireOrder::from).collect(),
  };
  serde_json::to_string_pretty(&doc)
}

fn to_order(raw: &RawOrder, token: Token, location: &str) -> Result<Order, ImportError> {
  let side = raw
    .side
    .as_deref()
    .unwrap_or_default()
    .parse::<Side>()
    .map_err(|e| invalid(location, e))?;

  Ok(Order::new(
    SideToken::new(side, token),
    parse_amount(&raw.maker_amount),
    parse_amount(&raw.taker_amount),
    parse_amount(&raw.making),
  ))
}

fn parse_token(token: &str, location: &str) -> Result<Token, ImportError> {
  token.parse().map_err(|e| invalid(location, e))
}

fn invalid(location: &str, source: OrderError) -> ImportError {
  ImportError::InvalidOrder {
    location: location.to_string(),
    source,
  }
}

/// Numbers and numeric strings become decimals; everything else is zero.
fn parse_amount(value: &Value) -> Decimal {
  let text = match value {
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.trim().to_string(),
    _ => return Decimal::ZERO,
  };
  Decimal::from_str(&text)
    .or_else(|_| Decimal::from_scientific(&text))
    .unwrap_or(Decimal::ZERO)
}

/// Exact decimal text of the amount; integral amounts come out as integers.
fn to_number(amount: Decimal) -> Number {
  amount
    .normalize()
    .to_string()
    .parse()
    .unwrap_or_else(|_| Number::from(0))
}

/// Strict equality: strings as written, numbers by value, mixed kinds never match.
fn same_token_id(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::String(x), Value::String(y)) => x == y,
    (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Null, Value::Null) => true,
    _ => false,
  }
}
