//! SHT20 temperature/humidity sensor driver
//!
//! Async driver for the Sensirion SHT20, generic over the
//! `embedded-hal-async` I2C and delay traits so boards can supply any
//! bus implementation and tests can run against a mock.
//!
//! Measurements use no-hold-master mode: the trigger command is written,
//! the worst-case conversion time is waited out, and the result is read
//! back in a separate transfer. Hold-master mode stretches SCL for the
//! whole conversion, which not every I2C peripheral tolerates.
//!
//! Each measurement is three bytes: MSB, LSB, CRC-8. The checksum is
//! validated and the two status bits in the LSB are masked before the
//! raw word is returned.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

/// Fixed I2C bus address of the SHT20 (the part has no address pins).
pub const ADDRESS: u8 = 0x40;

/// Trigger a temperature measurement, no-hold-master mode.
const CMD_TRIGGER_TEMP_NOHOLD: u8 = 0xF3;
/// Trigger a humidity measurement, no-hold-master mode.
const CMD_TRIGGER_HUMI_NOHOLD: u8 = 0xF4;
/// Read the user register.
const CMD_READ_USER_REG: u8 = 0xE7;
/// Soft reset, reboots the sensor without cutting power.
const CMD_SOFT_RESET: u8 = 0xFE;
/// First half of the electronic identification code (memory location 1).
const CMD_SERIAL_FIRST: [u8; 2] = [0xFA, 0x0F];
/// Second half of the electronic identification code (memory location 2).
const CMD_SERIAL_SECOND: [u8; 2] = [0xFC, 0xC9];

/// Worst-case conversion time for a 14-bit temperature measurement (ms).
const TEMP_MEASUREMENT_MS: u32 = 85;
/// Worst-case conversion time for a 12-bit humidity measurement (ms).
const HUMI_MEASUREMENT_MS: u32 = 29;
/// Power-up time after a soft reset (ms).
const SOFT_RESET_MS: u32 = 15;

/// CRC-8 polynomial from the SHT2x datasheet: x^8 + x^5 + x^4 + 1.
const CRC8_POLYNOMIAL: u8 = 0x31;

/// The two least-significant bits of a measurement carry status, not data.
const STATUS_BITS_MASK: u16 = 0xFFFC;

/// SHT20 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C bus error
    Bus(E),
    /// Measurement checksum mismatch
    Crc,
}

/// One raw temperature/humidity measurement pair
///
/// Raw words keep the full sensor resolution; convert with
/// [`Measurement::temperature_celsius`] and [`Measurement::humidity_percent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Raw 14-bit temperature word (status bits cleared)
    pub raw_temperature: u16,
    /// Raw 12-bit humidity word (status bits cleared)
    pub raw_humidity: u16,
}

impl Measurement {
    /// Temperature in degrees Celsius
    pub fn temperature_celsius(&self) -> f32 {
        convert_temperature(self.raw_temperature)
    }

    /// Relative humidity in percent
    pub fn humidity_percent(&self) -> f32 {
        convert_humidity(self.raw_humidity)
    }
}

/// Convert a raw temperature word to degrees Celsius.
///
/// Datasheet formula: T = -46.85 + 175.72 * S_T / 2^16
pub fn convert_temperature(raw: u16) -> f32 {
    -46.85 + 175.72 * f32::from(raw) / 65536.0
}

/// Convert a raw humidity word to percent relative humidity.
///
/// Datasheet formula: RH = -6 + 125 * S_RH / 2^16
///
/// Values slightly outside 0..=100 %RH are physical per the datasheet
/// and are not clamped here.
pub fn convert_humidity(raw: u16) -> f32 {
    -6.0 + 125.0 * f32::from(raw) / 65536.0
}

/// CRC-8 over `data`, initial value 0x00, MSB first, no final XOR.
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0x00;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// SHT20 driver
///
/// Owns the I2C bus handle. Delays are passed per call so the driver
/// stays free of any timer dependency.
pub struct Sht20<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Sht20<I2C> {
    /// Create a driver on the given bus
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Release the bus handle
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Soft-reset the sensor and wait out its power-up time
    pub async fn soft_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(ADDRESS, &[CMD_SOFT_RESET])
            .await
            .map_err(Error::Bus)?;
        delay.delay_ms(SOFT_RESET_MS).await;
        Ok(())
    }

    /// Read the user register (resolution, battery status, heater bits)
    pub async fn read_user_register(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.i2c
            .write(ADDRESS, &[CMD_READ_USER_REG])
            .await
            .map_err(Error::Bus)?;
        let mut value = [0u8; 1];
        self.i2c.read(ADDRESS, &mut value).await.map_err(Error::Bus)?;
        Ok(value[0])
    }

    /// Read the 64-bit electronic identification code
    ///
    /// The serial number is spread over two memory reads; the returned
    /// word is assembled as SNA | SNB | SNC, most significant first.
    /// The interleaved per-word CRC bytes are not checked here.
    pub async fn serial_number(&mut self) -> Result<u64, Error<I2C::Error>> {
        // Location 1: SNB_3, CRC, SNB_2, CRC, SNB_1, CRC, SNB_0, CRC
        self.i2c
            .write(ADDRESS, &CMD_SERIAL_FIRST)
            .await
            .map_err(Error::Bus)?;
        let mut first = [0u8; 8];
        self.i2c.read(ADDRESS, &mut first).await.map_err(Error::Bus)?;

        // Location 2: SNC_1, SNC_0, CRC, SNA_1, SNA_0, CRC
        self.i2c
            .write(ADDRESS, &CMD_SERIAL_SECOND)
            .await
            .map_err(Error::Bus)?;
        let mut second = [0u8; 6];
        self.i2c.read(ADDRESS, &mut second).await.map_err(Error::Bus)?;

        Ok(u64::from_be_bytes([
            second[3], // SNA_1
            second[4], // SNA_0
            first[0],  // SNB_3
            first[2],  // SNB_2
            first[4],  // SNB_1
            first[6],  // SNB_0
            second[0], // SNC_1
            second[1], // SNC_0
        ]))
    }

    /// Measure temperature and humidity
    ///
    /// Runs one temperature and one humidity conversion back to back and
    /// returns the raw words with checksums validated.
    pub async fn measure(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<Measurement, Error<I2C::Error>> {
        let raw_temperature = self
            .read_raw(CMD_TRIGGER_TEMP_NOHOLD, TEMP_MEASUREMENT_MS, delay)
            .await?;
        let raw_humidity = self
            .read_raw(CMD_TRIGGER_HUMI_NOHOLD, HUMI_MEASUREMENT_MS, delay)
            .await?;
        Ok(Measurement {
            raw_temperature,
            raw_humidity,
        })
    }

    async fn read_raw(
        &mut self,
        command: u8,
        conversion_ms: u32,
        delay: &mut impl DelayNs,
    ) -> Result<u16, Error<I2C::Error>> {
        self.i2c
            .write(ADDRESS, &[command])
            .await
            .map_err(Error::Bus)?;
        delay.delay_ms(conversion_ms).await;

        let mut frame = [0u8; 3];
        self.i2c.read(ADDRESS, &mut frame).await.map_err(Error::Bus)?;

        if crc8(&frame[..2]) != frame[2] {
            return Err(Error::Crc);
        }

        Ok(u16::from_be_bytes([frame[0], frame[1]]) & STATUS_BITS_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use std::vec;

    #[test]
    fn crc_matches_datasheet_example() {
        // Worked example from the SHT2x CRC application note
        assert_eq!(crc8(&[0x68, 0x3A]), 0x7C);
    }

    #[test]
    fn crc_of_zeroes_is_zero() {
        assert_eq!(crc8(&[0x00, 0x00]), 0x00);
    }

    #[test]
    fn temperature_conversion_reference_points() {
        assert!((convert_temperature(0x0000) - (-46.85)).abs() < 0.01);
        assert!((convert_temperature(0x8000) - 41.01).abs() < 0.01);
    }

    #[test]
    fn humidity_conversion_reference_points() {
        assert!((convert_humidity(0x0000) - (-6.0)).abs() < 0.01);
        assert!((convert_humidity(0x8000) - 56.5).abs() < 0.01);
    }

    #[test]
    fn measure_reads_both_channels() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![CMD_TRIGGER_TEMP_NOHOLD]),
            Transaction::read(ADDRESS, vec![0x68, 0x3A, 0x7C]),
            Transaction::write(ADDRESS, vec![CMD_TRIGGER_HUMI_NOHOLD]),
            Transaction::read(ADDRESS, vec![0x4E, 0x85, 0x6B]),
        ]);
        let mut sensor = Sht20::new(i2c.clone());

        let measurement = block_on(sensor.measure(&mut NoopDelay::new())).unwrap();
        // Status bits in the LSB are cleared
        assert_eq!(measurement.raw_temperature, 0x683A & STATUS_BITS_MASK);
        assert_eq!(measurement.raw_humidity, 0x4E85 & STATUS_BITS_MASK);

        i2c.done();
    }

    #[test]
    fn measure_rejects_bad_checksum() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![CMD_TRIGGER_TEMP_NOHOLD]),
            Transaction::read(ADDRESS, vec![0x68, 0x3A, 0x00]),
        ]);
        let mut sensor = Sht20::new(i2c.clone());

        let result = block_on(sensor.measure(&mut NoopDelay::new()));
        assert_eq!(result, Err(Error::Crc));

        i2c.done();
    }

    #[test]
    fn serial_number_assembles_electronic_id() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![0xFA, 0x0F]),
            // SNB_3..SNB_0 with interleaved CRC bytes
            Transaction::read(ADDRESS, vec![0xDE, 0, 0xAD, 0, 0xBE, 0, 0xEF, 0]),
            Transaction::write(ADDRESS, vec![0xFC, 0xC9]),
            // SNC_1, SNC_0, CRC, SNA_1, SNA_0, CRC
            Transaction::read(ADDRESS, vec![0x11, 0x22, 0, 0x33, 0x44, 0]),
        ]);
        let mut sensor = Sht20::new(i2c.clone());

        let serial = block_on(sensor.serial_number()).unwrap();
        assert_eq!(serial, 0x3344_DEAD_BEEF_1122);

        i2c.done();
    }

    #[test]
    fn soft_reset_sends_command() {
        let mut i2c = Mock::new(&[Transaction::write(ADDRESS, vec![CMD_SOFT_RESET])]);
        let mut sensor = Sht20::new(i2c.clone());

        block_on(sensor.soft_reset(&mut NoopDelay::new())).unwrap();

        i2c.done();
    }

    #[test]
    fn user_register_default_value() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![CMD_READ_USER_REG]),
            Transaction::read(ADDRESS, vec![0x02]),
        ]);
        let mut sensor = Sht20::new(i2c.clone());

        assert_eq!(block_on(sensor.read_user_register()).unwrap(), 0x02);

        i2c.done();
    }
}
