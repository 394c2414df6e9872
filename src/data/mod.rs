/// Data layer: records, loading, schema inference, filtering and statistics.
///
/// Architecture:
/// ```text
///  /api/vectors  or  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────────┐
///   │ source/loader │  fetch + parse → RecordStore (bad rows dropped)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  fields + distinct values → filter controls
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState predicate → view indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  count, mean, std per axis
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod schema;
pub mod filter;
pub mod source;
pub mod stats;
