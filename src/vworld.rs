//! VWorld 공간정보 오픈API 클라이언트 (지오코더 + WFS).

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry;
use crate::model::AdminDistrict;
use crate::projection;

pub const DEFAULT_WFS_URL: &str = "https://api.vworld.kr/req/wfs";
pub const DEFAULT_GEOCODER_URL: &str = "https://api.vworld.kr/req/address";

/// 행정동 경계 레이어
pub const ADMIN_DISTRICT_LAYER: &str = "lt_c_ademd_info";

const DEFAULT_FEATURE_COUNT: usize = 1000;
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// 두 모서리 좌표(순서 무관)로 bbox를 만든다.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x_min: a.0.min(b.0),
            y_min: a.1.min(b.1),
            x_max: a.0.max(b.0),
            y_max: a.1.max(b.1),
        }
    }
}

pub struct VworldClient {
    api_key: String,
    wfs_url: String,
    geocoder_url: String,
    http: reqwest::blocking::Client,
}

impl VworldClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(format!("korea-odata/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            wfs_url: DEFAULT_WFS_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            http,
        })
    }

    /// 도로명 주소 -> (경도, 위도) [deg].
    pub fn geocode(&self, address: &str) -> Result<(f64, f64)> {
        debug!("geocoding address: {}", address);
        let body = self
            .http
            .get(&self.geocoder_url)
            .query(&[
                ("service", "address"),
                ("request", "getcoord"),
                ("crs", "EPSG:4326"),
                ("address", address),
                ("format", "json"),
                ("type", "road"),
                ("key", &self.api_key),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        parse_geocode(&body, address)
    }

    /// bbox 범위의 WFS GetFeature 호출 (GeoJSON 출력).
    pub fn features(
        &self,
        bbox: &BoundingBox,
        type_name: &str,
        count: usize,
    ) -> Result<FeatureCollection> {
        let bbox_param = format!(
            "{},{},{},{}",
            bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max
        );
        let count_param = count.to_string();
        debug!("WFS GetFeature {} bbox={}", type_name, bbox_param);

        let body = self
            .http
            .get(&self.wfs_url)
            .query(&[
                ("SERVICE", "WFS"),
                ("REQUEST", "GetFeature"),
                ("TYPENAME", type_name),
                ("BBOX", bbox_param.as_str()),
                ("VERSION", "2.0.0"),
                ("COUNT", count_param.as_str()),
                ("STARTINDEX", "0"),
                ("SRSNAME", "EPSG:4326"),
                ("OUTPUT", "application/json"),
                ("EXCEPTIONS", "text/xml"),
                ("KEY", &self.api_key),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        parse_feature_collection(&body)
    }

    /// 두 주소를 지오코딩해 bbox를 만들고, 그 안의 행정동 경계를
    /// UTM으로 투영해 돌려준다. 이름/면적 필터는 호출자 몫이다.
    pub fn admin_districts(&self, address1: &str, address2: &str) -> Result<Vec<AdminDistrict>> {
        let a = self.geocode(address1)?;
        let b = self.geocode(address2)?;
        let bbox = BoundingBox::from_corners(a, b);

        let collection = self.features(&bbox, ADMIN_DISTRICT_LAYER, DEFAULT_FEATURE_COUNT)?;
        districts_from_features(collection)
    }
}

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub properties: DistrictProperties,
    pub geometry: MultiPolygon,
}

#[derive(Debug, Deserialize)]
pub struct DistrictProperties {
    pub full_nm: String,
    pub emd_cd: String,
}

#[derive(Debug, Deserialize)]
pub struct MultiPolygon {
    #[serde(rename = "type")]
    pub kind: String,
    /// polygons -> rings -> (lon, lat)
    pub coordinates: Vec<Vec<Vec<(f64, f64)>>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEnvelope {
    response: GeocodeResponse,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    result: Option<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    point: GeocodePoint,
}

#[derive(Debug, Deserialize)]
struct GeocodePoint {
    x: String,
    y: String,
}

fn parse_geocode(body: &str, address: &str) -> Result<(f64, f64)> {
    let envelope: GeocodeEnvelope = serde_json::from_str(body)?;

    if envelope.response.status != "OK" {
        return Err(Error::AddressNotFound(address.to_string()));
    }
    let result = envelope
        .response
        .result
        .ok_or_else(|| Error::AddressNotFound(address.to_string()))?;

    let x = result.point.x.parse::<f64>()?;
    let y = result.point.y.parse::<f64>()?;
    Ok((x, y))
}

pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection> {
    Ok(serde_json::from_str(body)?)
}

/// 피처의 외곽 링(첫 폴리곤의 첫 링)을 UTM으로 투영해 행정동으로 만든다.
pub fn districts_from_features(collection: FeatureCollection) -> Result<Vec<AdminDistrict>> {
    let mut districts = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let outer = match feature
            .geometry
            .coordinates
            .first()
            .and_then(|polygon| polygon.first())
        {
            Some(ring) if !ring.is_empty() => ring,
            // 빈 지오메트리는 건너뜀
            _ => continue,
        };

        let mut ring = Vec::with_capacity(outer.len() + 1);
        for &(lon, lat) in outer {
            let utm = projection::latlon_to_utm(lat, lon)?;
            ring.push((utm.easting, utm.northing));
        }
        geometry::close_ring(&mut ring);

        let area = geometry::ring_area(&ring);
        let centroid = geometry::ring_centroid(&ring);

        districts.push(AdminDistrict {
            name: feature.properties.full_nm,
            code: feature.properties.emd_cd,
            ring,
            area,
            centroid,
        });
    }

    Ok(districts)
}
