//! Erros específicos do driver OPT4048

use thiserror::Error;

use crate::sample::Channel;

pub type Opt4048Result<T> = Result<T, Opt4048Error>;

/// Falha no transporte de registradores (I2C ou equivalente)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("No acknowledge from device at {address:#04x}")]
    Nack { address: u8 },

    #[error("Bus transfer failed: {0}")]
    Transfer(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Caso matemático indefinido na colorimetria
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DomainError {
    /// X + Y + Z == 0 (escuridão total, todos os códigos zerados)
    #[error("Tristimulus sum is zero, chromaticity is undefined")]
    ZeroTristimulus,

    /// y == 0.1858, denominador de McCamy nulo
    #[error("CCT undefined for chromaticity y = {y}")]
    CctUndefined { y: f64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Opt4048Error {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("Checksum mismatch on {channel:?}: transmitted {transmitted:#03x}, computed {computed:#03x}")]
    Checksum {
        channel: Channel,
        transmitted: u8,
        computed: u8,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid {field} encoding: {value:#04x}")]
    InvalidField { field: &'static str, value: u8 },

    #[error("Device not found: unexpected device id {found:#06x}")]
    DeviceNotFound { found: u16 },

    #[error("Configuration file error: {0}")]
    Config(String),
}

impl Opt4048Error {
    /// Erros que justificam repetir a leitura
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bus(_) | Self::Checksum { .. })
    }
}
