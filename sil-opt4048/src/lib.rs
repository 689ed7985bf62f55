//! # 🌈 sil-opt4048 — L0 Sensor Triestímulo
//!
//! Driver do OPT4048, sensor de cor de 4 canais (R, G, B e banda larga) com
//! saída em formato mantissa/expoente. Responsável por transformar os bytes
//! dos registradores em códigos ADC validados e depois em grandezas
//! fotométricas e colorimétricas.
//!
//! ## Pipeline
//!
//! ```text
//! RegisterTransport ──16 bytes──▶ decode_frame ──▶ QuadChannelFrame
//!                                                    │
//!                        ChecksumStatus::check ◀─────┤ (opcional)
//!                                                    ▼
//!                               lux · (x, y) · CCT (McCamy)
//! ```
//!
//! - [`registers`]: endereços, máscaras e ordem de bytes
//! - [`transport`]: trait de barramento e adaptador `embedded-hal`
//! - [`sample`]: decodificação das amostras
//! - [`checksum`]: paridade de 4 bits do datasheet
//! - [`colorimetry`]: matriz de calibração, cromaticidade e CCT
//! - [`config`]: enums de hardware e [`DriverConfig`]
//! - [`device`]: o driver [`Opt4048`]
//!
//! ## Exemplo
//!
//! ```ignore
//! use sil_opt4048::{DriverConfig, Opt4048};
//!
//! let mut sensor = Opt4048::from_i2c(i2c, DriverConfig::default())?;
//! sensor.init()?;
//! let measurement = sensor.read_frame()?;
//! let color = sil_opt4048::derive_color(&measurement.verified()?)?;
//! println!("{:.1} lux, {:.0} K", color.lux, color.cct);
//! ```

pub mod error;
pub mod registers;
pub mod transport;
pub mod sample;
pub mod checksum;
pub mod colorimetry;
pub mod config;
pub mod device;

pub use error::{BusError, DomainError, Opt4048Error, Opt4048Result};
pub use registers::ByteOrder;
pub use transport::{I2cTransport, RegisterTransport};
pub use sample::{decode_channel, decode_frame, Channel, ChannelSample, QuadChannelFrame};
pub use checksum::{compute_checksum, validate_checksum, ChecksumStatus};
pub use colorimetry::{
    compute_cct, compute_chromaticity, compute_lux, compute_tristimulus, derive_color, mccamy_cct,
    CalibrationMatrix, Chromaticity, DerivedColor, Tristimulus, CIE_MATRIX,
};
pub use config::{
    ConversionTime, DriverConfig, FaultCount, IntMechanism, OperationMode, Range, StatusFlags,
    ThresholdChannel,
};
pub use device::{Measurement, Opt4048};
