pub mod engine;

pub use engine::{resolve_price, PriceResolution, PricingRequest, ResolvedCommission};
