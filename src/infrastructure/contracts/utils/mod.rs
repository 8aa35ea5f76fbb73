pub mod units;

pub use units::{format_eth, format_price, parse_eth_amount, UnitsError};
