use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// WGS-84
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQUARED: f64 = 0.00669437999014;

/// Observer location on the Earth's surface, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ViewerPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl ViewerPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    /// Parse `"lat,lon"`.
    pub fn from_coordinates(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self::new(lat, lon))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    /// Distance to another position in the lat/lon plane, in degrees.
    pub fn delta(&self, other: &ViewerPosition) -> f64 {
        let dlat = self.latitude_deg - other.latitude_deg;
        let dlon = self.longitude_deg - other.longitude_deg;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    /// Earth-fixed position at sea level, km.
    pub fn position_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = EARTH_EQUATORIAL_RADIUS_KM
            / (1.0 - EARTH_ECCENTRICITY_SQUARED * sin_lat * sin_lat).sqrt();
        [
            n * cos_lat * lon.cos(),
            n * cos_lat * lon.sin(),
            n * (1.0 - EARTH_ECCENTRICITY_SQUARED) * sin_lat,
        ]
    }
}

/// A committed viewer position with its derived geometry.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    position: [f64; 3],
    lat_rad: f64,
    lon_rad: f64,
}

impl Observer {
    pub fn new(viewer: &ViewerPosition) -> Self {
        Self {
            position: viewer.position_km(),
            lat_rad: viewer.lat_rad(),
            lon_rad: viewer.lon_rad(),
        }
    }

    /// Sine of the elevation of an Earth-fixed point above the local horizon,
    /// i.e. the cosine of its angular distance from the zenith.
    pub fn zenith_dot(&self, target_km: [f64; 3]) -> f64 {
        let dr = [
            target_km[0] - self.position[0],
            target_km[1] - self.position[1],
            target_km[2] - self.position[2],
        ];
        let range_km = length(dr);
        if range_km <= 0.0 {
            return 1.0;
        }
        let (_, _, up) = ecef_to_enu(dr, self.lat_rad, self.lon_rad);
        up / range_km
    }
}

/// Cosine of the zenith angle for a given elevation cutoff.
pub fn min_zenith_dot(min_elevation_deg: f64) -> f64 {
    (90.0 - min_elevation_deg).to_radians().cos()
}

/// Rotate an inertial (TEME) vector about the z axis into the Earth-fixed frame.
pub fn rotate_to_earth_fixed(position: [f64; 3], earth_phase: f64) -> [f64; 3] {
    let cos_phase = earth_phase.cos();
    let sin_phase = earth_phase.sin();
    [
        position[0] * cos_phase + position[1] * sin_phase,
        -position[0] * sin_phase + position[1] * cos_phase,
        position[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    length([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

fn length(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
