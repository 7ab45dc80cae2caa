// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Aggregate statistics over range query results.

pub mod accumulator;
pub mod metrics;
