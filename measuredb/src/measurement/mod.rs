// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Measurement records and the fields they carry.

pub mod field;
pub mod measurement;
