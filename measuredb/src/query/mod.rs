// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Range queries over stored measurements, and date range discovery.

pub mod date_range;
pub mod range_query;
pub mod time_range;
