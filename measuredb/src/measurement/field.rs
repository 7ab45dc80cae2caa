// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::MeasureDBError;

/// One of the numeric readings carried by every measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
  Field1,
  Field2,
  Field3,
}

impl Field {
  /// All fields, in declaration order.
  pub const ALL: [Field; 3] = [Field::Field1, Field::Field2, Field::Field3];

  /// Name of this field as used in queries and responses.
  pub fn as_str(&self) -> &'static str {
    match self {
      Field::Field1 => "field1",
      Field::Field2 => "field2",
      Field::Field3 => "field3",
    }
  }

  /// Parse an optional field query parameter. A missing or empty parameter is reported as such,
  /// separately from an unknown field name.
  pub fn parse_param(value: Option<&str>) -> Result<Field, MeasureDBError> {
    match value {
      None | Some("") => Err(MeasureDBError::MissingField),
      Some(name) => name.parse(),
    }
  }
}

impl FromStr for Field {
  type Err = MeasureDBError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Field::ALL
      .into_iter()
      .find(|field| field.as_str() == s)
      .ok_or_else(|| MeasureDBError::InvalidField(s.to_owned()))
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
