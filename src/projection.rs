use crate::error::{Error, Result};

const RADIANS_PER_DEGREE: f64 = std::f64::consts::PI / 180.0;
const DEGREES_PER_RADIAN: f64 = 180.0 / std::f64::consts::PI;

pub const WGS84_A: f64 = 6_378_137.0;
pub const WGS84_E: f64 = 0.081_819_190_8;

const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const E2: f64 = WGS84_E * WGS84_E;
const E4: f64 = E2 * E2;
const E6: f64 = E4 * E2;
const EP2: f64 = E2 / (1.0 - E2);

/// I와 O를 건너뛴 위도 밴드 문자 (8도 간격, X만 12도)
const BAND_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWX";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoord {
    /// 동쪽 좌표 [m]
    pub easting: f64,
    /// 북쪽 좌표 [m] (남반구는 10,000,000m 오프셋 적용)
    pub northing: f64,
    pub zone_number: u8,
    pub zone_letter: char,
}

/// 위도 -> UTM 밴드 문자. 밴드 범위(-80..=84) 밖이면 None.
pub fn zone_letter(lat: f64) -> Option<char> {
    if !(-80.0..=84.0).contains(&lat) {
        return None;
    }
    let index = (((lat + 80.0) / 8.0) as usize).min(BAND_LETTERS.len() - 1);
    Some(BAND_LETTERS[index] as char)
}

/// WGS84 (위도, 경도) [deg] -> UTM (easting, northing) [m].
///
/// 경도는 [-180, 180) 범위로 정규화하고, 존 번호는 6도 단위로 결정한다.
/// 남반구(lat < 0)는 false northing 10,000,000m을 더한다.
pub fn latlon_to_utm(lat: f64, lon: f64) -> Result<UtmCoord> {
    let letter = zone_letter(lat).ok_or(Error::LatitudeOutOfRange(lat))?;

    // 경도 정규화
    let lon = (lon + 180.0) - ((lon + 180.0) / 360.0).floor() * 360.0 - 180.0;

    let zone_number = ((lon + 180.0) / 6.0).floor() as i32 + 1;
    let lon_origin = f64::from((zone_number - 1) * 6 - 180 + 3);

    let lat_rad = lat * RADIANS_PER_DEGREE;
    let lon_rad = lon * RADIANS_PER_DEGREE;
    let lon_origin_rad = lon_origin * RADIANS_PER_DEGREE;

    let n = WGS84_A / (1.0 - E2 * lat_rad.sin() * lat_rad.sin()).sqrt();
    let t = lat_rad.tan() * lat_rad.tan();
    let c = EP2 * lat_rad.cos() * lat_rad.cos();
    let a = lat_rad.cos() * (lon_rad - lon_origin_rad);

    // 적도에서 위도까지의 자오선 호 길이
    let m = WGS84_A
        * ((1.0 - E2 / 4.0 - 3.0 * E4 / 64.0 - 5.0 * E6 / 256.0) * lat_rad
            - (3.0 * E2 / 8.0 + 3.0 * E4 / 32.0 + 45.0 * E6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * E4 / 256.0 + 45.0 * E6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * E6 / 3072.0) * (6.0 * lat_rad).sin());

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * EP2) * a.powi(5) / 120.0)
        + UTM_FALSE_EASTING;

    let mut northing = UTM_K0
        * (m + n
            * lat_rad.tan()
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * EP2) * a.powi(6) / 720.0));

    if lat < 0.0 {
        northing += UTM_FALSE_NORTHING_SOUTH;
    }

    Ok(UtmCoord {
        easting,
        northing,
        zone_number: zone_number as u8,
        zone_letter: letter,
    })
}

/// UTM -> WGS84 (위도, 경도) [deg].
///
/// 밴드 문자가 'N' 미만이면 남반구로 보고 false northing을 되돌린다.
pub fn utm_to_latlon(utm: &UtmCoord) -> (f64, f64) {
    let e1 = (1.0 - (1.0 - E2).sqrt()) / (1.0 + (1.0 - E2).sqrt());

    let x = utm.easting - UTM_FALSE_EASTING;
    let mut y = utm.northing;
    if utm.zone_letter < 'N' {
        y -= UTM_FALSE_NORTHING_SOUTH;
    }

    let lon_origin = f64::from((i32::from(utm.zone_number) - 1) * 6 - 180 + 3);

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - E2 / 4.0 - 3.0 * E4 / 64.0 - 5.0 * E6 / 256.0));

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let n1 = WGS84_A / (1.0 - E2 * phi1.sin() * phi1.sin()).sqrt();
    let t1 = phi1.tan() * phi1.tan();
    let c1 = EP2 * phi1.cos() * phi1.cos();
    let r1 = WGS84_A * (1.0 - E2) / (1.0 - E2 * phi1.sin() * phi1.sin()).powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat_rad = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * EP2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * EP2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon_offset = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * EP2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / phi1.cos();

    let lat = lat_rad * DEGREES_PER_RADIAN;
    let lon = lon_origin + lon_offset * DEGREES_PER_RADIAN;

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_letter_bands() {
        assert_eq!(zone_letter(-80.0), Some('C'));
        assert_eq!(zone_letter(0.0), Some('N'));
        assert_eq!(zone_letter(37.5), Some('S'));
        assert_eq!(zone_letter(72.0), Some('X'));
        assert_eq!(zone_letter(84.0), Some('X'));
        assert_eq!(zone_letter(84.1), None);
        assert_eq!(zone_letter(-80.1), None);
    }

    #[test]
    fn test_seoul_city_hall() {
        let utm = latlon_to_utm(37.5665, 126.9780).unwrap();

        assert_eq!(utm.zone_number, 52);
        assert_eq!(utm.zone_letter, 'S');
        // 중앙 자오선(129E)보다 서쪽이므로 false easting 아래
        assert!(utm.easting > 300_000.0 && utm.easting < 350_000.0);
        assert!(utm.northing > 4_100_000.0 && utm.northing < 4_200_000.0);
    }

    #[test]
    fn test_southern_hemisphere_offset() {
        // 시드니
        let utm = latlon_to_utm(-33.8688, 151.2093).unwrap();

        assert_eq!(utm.zone_number, 56);
        assert_eq!(utm.zone_letter, 'H');
        assert!(utm.northing > 5_000_000.0, "false northing not applied");

        let (lat, lon) = utm_to_latlon(&utm);
        assert!((lat - (-33.8688)).abs() < 1e-6);
        assert!((lon - 151.2093).abs() < 1e-6);
    }

    #[test]
    fn test_equator_has_no_offset() {
        let utm = latlon_to_utm(0.0, 127.0).unwrap();
        assert!(utm.northing.abs() < 1_000_000.0);
        assert_eq!(utm.zone_letter, 'N');
    }

    #[test]
    fn test_round_trip_grid() {
        for lat_deg in (-76..=76).step_by(8) {
            for lon_deg in (-177..=177).step_by(7) {
                let lat = lat_deg as f64 + 0.123_456;
                let lon = lon_deg as f64 + 0.654_321;

                let utm = latlon_to_utm(lat, lon).unwrap();
                let (lat2, lon2) = utm_to_latlon(&utm);

                assert!(
                    (lat - lat2).abs() < 1e-6,
                    "lat round trip failed at ({lat}, {lon}): {lat2}"
                );
                assert!(
                    (lon - lon2).abs() < 1e-6,
                    "lon round trip failed at ({lat}, {lon}): {lon2}"
                );
            }
        }
    }

    #[test]
    fn test_longitude_normalization() {
        let a = latlon_to_utm(37.0, 127.0).unwrap();
        let b = latlon_to_utm(37.0, 127.0 - 360.0).unwrap();

        assert_eq!(a.zone_number, b.zone_number);
        assert!((a.easting - b.easting).abs() < 1e-6);
        assert!((a.northing - b.northing).abs() < 1e-6);
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert!(matches!(
            latlon_to_utm(85.0, 127.0),
            Err(Error::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            latlon_to_utm(-81.0, 127.0),
            Err(Error::LatitudeOutOfRange(_))
        ));
    }
}
