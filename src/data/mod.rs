/// Data layer: loading, reshaping, normalisation and derived metrics.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │ reshape / normalize   │  year columns, aliases, wide → long,
///   └──────────────────────┘  country filter, disaster aggregation
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  tidy Series per (source, path, fingerprint)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ filter / metrics  │  year window, joins, share %, Pearson, trend
///   └──────────────────┘
/// ```

pub mod cache;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod reshape;
