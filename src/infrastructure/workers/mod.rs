pub mod price_listener;

pub use price_listener::{ContractLogSource, LogSource, PriceListener, PriceSubscription};
