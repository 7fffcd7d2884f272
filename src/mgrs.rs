//! MGRS grid reference decoding
//!
//! Converts a Military Grid Reference System reference (WGS84, standard
//! lettering) to latitude/longitude via UTM. The result is the south-west
//! corner of the referenced square, matching the usual `toLatLon` behaviour.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MgrsError {
    #[error("Invalid MGRS zone: {0}")]
    Zone(String),

    #[error("Invalid MGRS latitude band: {0}")]
    Band(char),

    #[error("Invalid MGRS 100km square: {0}")]
    Square(String),

    #[error("Invalid MGRS easting/northing digits: {0}")]
    Digits(String),
}

pub type Result<T> = std::result::Result<T, MgrsError>;

// Letters of the first column / row of the 100km grid, per zone set 1..=6
const SET_ORIGIN_COLUMN_LETTERS: &[u8; 6] = b"AJSAJS";
const SET_ORIGIN_ROW_LETTERS: &[u8; 6] = b"AFAFAF";

// WGS84 / UTM constants
const K0: f64 = 0.9996;
const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
const ECC_SQUARED: f64 = 0.006_694_38;
const FALSE_EASTING: f64 = 500_000.0;
const SOUTHERN_FALSE_NORTHING: f64 = 10_000_000.0;

/// Cheap shape check: zone digits, band, two square letters, 2-10 digits
#[must_use]
pub fn looks_like_mgrs(input: &str) -> bool {
    let bytes = input.as_bytes();
    let zone_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if !(1..=2).contains(&zone_len) || bytes.len() < zone_len + 3 {
        return false;
    }

    let band = bytes[zone_len].to_ascii_uppercase();
    let square = &bytes[zone_len + 1..zone_len + 3];
    let digits = &bytes[zone_len + 3..];

    (b'C'..=b'X').contains(&band)
        && square.iter().all(u8::is_ascii_alphabetic)
        && (2..=10).contains(&digits.len())
        && digits.iter().all(u8::is_ascii_digit)
}

/// Decode an MGRS reference such as `18SUJ2348306479` to `(latitude, longitude)`
pub fn to_lat_lon(reference: &str) -> Result<(f64, f64)> {
    let reference: String = reference
        .split_whitespace()
        .collect::<String>()
        .to_ascii_uppercase();
    if !reference.is_ascii() {
        return Err(MgrsError::Zone(reference));
    }
    let bytes = reference.as_bytes();

    let zone_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if !(1..=2).contains(&zone_len) {
        return Err(MgrsError::Zone(reference.clone()));
    }
    let zone: u8 = reference[..zone_len]
        .parse()
        .map_err(|_| MgrsError::Zone(reference.clone()))?;
    if !(1..=60).contains(&zone) {
        return Err(MgrsError::Zone(zone.to_string()));
    }

    let band = *bytes
        .get(zone_len)
        .ok_or_else(|| MgrsError::Zone(reference.clone()))?;
    let min_northing = band_min_northing(band).ok_or(MgrsError::Band(band as char))?;

    let square = bytes
        .get(zone_len + 1..zone_len + 3)
        .ok_or_else(|| MgrsError::Square(reference.clone()))?;
    let (column, row) = (square[0], square[1]);

    let digits = &reference[zone_len + 3..];
    if digits.len() % 2 != 0 || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(MgrsError::Digits(digits.to_string()));
    }

    let set = zone_set(zone);
    let square_err = || MgrsError::Square(String::from_utf8_lossy(square).into_owned());
    let easting_100k = easting_from_letter(column, set).ok_or_else(square_err)?;
    let mut northing_100k = northing_from_letter(row, set).ok_or_else(square_err)?;
    while northing_100k < min_northing {
        northing_100k += 2_000_000.0;
    }

    let (easting_digits, northing_digits) = digits.split_at(digits.len() / 2);
    let easting = easting_100k + scale_digits(easting_digits)?;
    let northing = northing_100k + scale_digits(northing_digits)?;

    Ok(utm_to_lat_lon(easting, northing, zone, band))
}

fn zone_set(zone: u8) -> usize {
    match zone % 6 {
        0 => 6,
        set => usize::from(set),
    }
}

/// Metres represented by one half of the numeric part
fn scale_digits(digits: &str) -> Result<f64> {
    if digits.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = digits
        .parse()
        .map_err(|_| MgrsError::Digits(digits.to_string()))?;
    // digits.len() <= 5, so the exponent is 0..=4
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let exponent = 5 - digits.len() as i32;
    Ok(value * 10f64.powi(exponent))
}

/// Step a grid letter forward, skipping I and O and wrapping after `last`
fn walk_letters(origin: u8, target: u8, last: u8) -> Option<u32> {
    let mut current = origin;
    let mut steps = 0;
    let mut wrapped = false;
    while current != target {
        current += 1;
        if current == b'I' {
            current += 1;
        }
        if current == b'O' {
            current += 1;
        }
        if current > last {
            if wrapped {
                return None;
            }
            current = b'A';
            wrapped = true;
        }
        steps += 1;
    }
    Some(steps)
}

fn easting_from_letter(letter: u8, set: usize) -> Option<f64> {
    if !letter.is_ascii_uppercase() || letter == b'I' || letter == b'O' {
        return None;
    }
    let steps = walk_letters(SET_ORIGIN_COLUMN_LETTERS[set - 1], letter, b'Z')?;
    Some(100_000.0 * f64::from(steps + 1))
}

fn northing_from_letter(letter: u8, set: usize) -> Option<f64> {
    if !letter.is_ascii_uppercase() || letter > b'V' || letter == b'I' || letter == b'O' {
        return None;
    }
    let steps = walk_letters(SET_ORIGIN_ROW_LETTERS[set - 1], letter, b'V')?;
    Some(100_000.0 * f64::from(steps))
}

/// Lowest northing (metres) inside a latitude band
fn band_min_northing(band: u8) -> Option<f64> {
    let northing = match band {
        b'C' => 1_100_000.0,
        b'D' => 2_000_000.0,
        b'E' => 2_800_000.0,
        b'F' => 3_700_000.0,
        b'G' => 4_600_000.0,
        b'H' => 5_500_000.0,
        b'J' => 6_400_000.0,
        b'K' => 7_300_000.0,
        b'L' => 8_200_000.0,
        b'M' => 9_100_000.0,
        b'N' => 0.0,
        b'P' => 800_000.0,
        b'Q' => 1_700_000.0,
        b'R' => 2_600_000.0,
        b'S' => 3_500_000.0,
        b'T' => 4_400_000.0,
        b'U' => 5_300_000.0,
        b'V' => 6_200_000.0,
        b'W' => 7_000_000.0,
        b'X' => 7_900_000.0,
        _ => return None,
    };
    Some(northing)
}

/// Inverse transverse Mercator for a UTM zone
fn utm_to_lat_lon(easting: f64, northing: f64, zone: u8, band: u8) -> (f64, f64) {
    let ecc = ECC_SQUARED;
    let e1 = (1.0 - (1.0 - ecc).sqrt()) / (1.0 + (1.0 - ecc).sqrt());
    let ecc_prime = ecc / (1.0 - ecc);

    let x = easting - FALSE_EASTING;
    let y = if band < b'N' {
        northing - SOUTHERN_FALSE_NORTHING
    } else {
        northing
    };
    let long_origin = f64::from(zone - 1) * 6.0 - 180.0 + 3.0;

    let m = y / K0;
    let mu = m
        / (EQUATORIAL_RADIUS
            * (1.0 - ecc / 4.0 - 3.0 * ecc.powi(2) / 64.0 - 5.0 * ecc.powi(3) / 256.0));

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let n1 = EQUATORIAL_RADIUS / (1.0 - ecc * sin_phi1 * sin_phi1).sqrt();
    let t1 = phi1.tan().powi(2);
    let c1 = ecc_prime * phi1.cos().powi(2);
    let r1 = EQUATORIAL_RADIUS * (1.0 - ecc) / (1.0 - ecc * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ecc_prime) * d.powi(4)
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * ecc_prime
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ecc_prime + 24.0 * t1.powi(2))
            * d.powi(5)
            / 120.0)
        / phi1.cos();

    (lat.to_degrees(), long_origin + lon.to_degrees())
}
