pub mod client;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod model;
pub mod parser;
pub mod projection;
pub mod vworld;

pub use client::{collect_all, FetchOptions, PageSource, SeoulClient};
pub use error::{Error, Result};
pub use mapping::{CodeMapping, IncomeByDistrict};
pub use model::{AdminDistrict, Page, Record};
pub use projection::{latlon_to_utm, utm_to_latlon, UtmCoord};
pub use vworld::{BoundingBox, VworldClient};
