//! Sensor readings and their wire representation
//!
//! The collector protocol is line-oriented text: one CRLF-terminated
//! line per reading, e.g. `Temp: 24.50 C, Humi: 31.25 %`.

use core::fmt::Write;

use heapless::String;

use crate::sht20::Measurement;

/// Maximum encoded length of one reading line, CRLF included.
pub const LINE_CAPACITY: usize = 48;

/// One converted temperature/humidity reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_rh: f32,
}

impl Reading {
    /// Encode the reading as one collector protocol line.
    pub fn to_line(&self) -> String<LINE_CAPACITY> {
        let mut line = String::new();
        // f32 with two decimals always fits in LINE_CAPACITY
        write!(
            &mut line,
            "Temp: {:.2} C, Humi: {:.2} %\r\n",
            self.temperature_c, self.humidity_rh
        )
        .expect("reading line should fit in LINE_CAPACITY");
        line
    }
}

impl From<Measurement> for Reading {
    fn from(measurement: Measurement) -> Self {
        Self {
            temperature_c: measurement.temperature_celsius(),
            humidity_rh: measurement.humidity_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let reading = Reading {
            temperature_c: 24.5,
            humidity_rh: 31.25,
        };
        assert_eq!(reading.to_line(), "Temp: 24.50 C, Humi: 31.25 %\r\n");
    }

    #[test]
    fn line_format_negative_temperature() {
        let reading = Reading {
            temperature_c: -6.0,
            humidity_rh: 0.0,
        };
        assert_eq!(reading.to_line(), "Temp: -6.00 C, Humi: 0.00 %\r\n");
    }

    #[test]
    fn conversion_from_measurement() {
        let measurement = Measurement {
            raw_temperature: 0x8000,
            raw_humidity: 0x8000,
        };
        let reading = Reading::from(measurement);
        assert!((reading.temperature_c - 41.01).abs() < 0.01);
        assert!((reading.humidity_rh - 56.5).abs() < 0.01);
    }
}
