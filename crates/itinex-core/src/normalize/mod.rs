//! Field/value normalizers shared by every parser.
//!
//! Pure functions over text tokens: date normalization, arrival-date
//! inference, currency/amount splitting, and carrier-name resolution against
//! an injected catalog. None of them panic on malformed input.

pub mod amounts;
pub mod carriers;
pub mod dates;
pub mod patterns;

pub use amounts::split_currency_amount;
pub use carriers::{normalize_carrier, CarrierCatalog};
pub use dates::{infer_arrival_date, normalize_date, normalize_time};
