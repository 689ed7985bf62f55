//! Configuração do OPT4048
//!
//! Enums fechados com a codificação exata do hardware, os registradores de
//! controle como tipos de valor e o [`DriverConfig`] carregável de TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Opt4048Error, Opt4048Result};
use crate::registers::{self, ByteOrder};
use crate::transport::{ADDRESS_GND, ADDRESS_SCL, ADDRESS_SDA, ADDRESS_VDD};

/// Declara um enum de campo de registrador com discriminantes explícitos,
/// mais `bits()` e `TryFrom<u8>` gerados a partir da mesma lista
macro_rules! hardware_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $field:literal {
            $($(#[$variant_meta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(u8)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant = $value,)+
        }

        impl $name {
            #[inline]
            pub const fn bits(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Opt4048Error;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(Opt4048Error::InvalidField { field: $field, value }),
                }
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAMPOS DO REGISTRADOR DE CONTROLE
// ═══════════════════════════════════════════════════════════════════════════════

hardware_enum! {
    /// Faixa de medição (fundo de escala)
    pub enum Range as "range" {
        Lux2k2 = 0x00,
        Lux4k5 = 0x01,
        Lux9k = 0x02,
        Lux18k = 0x03,
        Lux36k = 0x04,
        Lux72k = 0x05,
        Lux144k = 0x06,
        #[default]
        Auto = 0x0C,
    }
}

hardware_enum! {
    /// Tempo de conversão por canal
    pub enum ConversionTime as "conversion_time" {
        Us600 = 0x00,
        Ms1 = 0x01,
        Ms1_8 = 0x02,
        Ms3_4 = 0x03,
        Ms6_5 = 0x04,
        Ms12_7 = 0x05,
        Ms25 = 0x06,
        Ms50 = 0x07,
        #[default]
        Ms100 = 0x08,
        Ms200 = 0x09,
        Ms400 = 0x0A,
        Ms800 = 0x0B,
    }
}

impl ConversionTime {
    /// Duração de uma conversão de um canal
    pub fn duration(self) -> Duration {
        let micros = match self {
            Self::Us600 => 600,
            Self::Ms1 => 1_000,
            Self::Ms1_8 => 1_800,
            Self::Ms3_4 => 3_400,
            Self::Ms6_5 => 6_500,
            Self::Ms12_7 => 12_700,
            Self::Ms25 => 25_000,
            Self::Ms50 => 50_000,
            Self::Ms100 => 100_000,
            Self::Ms200 => 200_000,
            Self::Ms400 => 400_000,
            Self::Ms800 => 800_000,
        };
        Duration::from_micros(micros)
    }

    /// Tempo até os quatro canais estarem convertidos
    pub fn frame_duration(self) -> Duration {
        self.duration() * 4
    }
}

hardware_enum! {
    pub enum OperationMode as "operation_mode" {
        PowerDown = 0x00,
        AutoOneShot = 0x01,
        OneShot = 0x02,
        #[default]
        Continuous = 0x03,
    }
}

hardware_enum! {
    /// Falhas consecutivas antes de disparar a interrupção
    pub enum FaultCount as "fault_count" {
        #[default]
        One = 0x00,
        Two = 0x01,
        Four = 0x02,
        Eight = 0x03,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAMPOS DO REGISTRADOR DE INTERRUPÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

hardware_enum! {
    /// Canal comparado contra os limiares
    pub enum ThresholdChannel as "threshold_channel" {
        #[default]
        Ch0 = 0x00,
        Ch1 = 0x01,
        Ch2 = 0x02,
        Ch3 = 0x03,
    }
}

hardware_enum! {
    /// Mecanismo do pino INT no fim da conversão
    pub enum IntMechanism as "int_mechanism" {
        #[default]
        SmbusAlert = 0x00,
        DataReadyNextChannel = 0x01,
        DataReadyAllChannels = 0x03,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRADORES COMO VALORES
// ═══════════════════════════════════════════════════════════════════════════════

/// Registrador 0x0A
///
/// `QWAKE[15] | 0[14] | RANGE[13:10] | CONVERSION_TIME[9:6] | OPERATING_MODE[5:4]
/// | LATCH[3] | INT_POL[2] | FAULT_COUNT[1:0]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRegister {
    pub quick_wake: bool,
    pub range: Range,
    pub conversion_time: ConversionTime,
    pub operation_mode: OperationMode,
    pub latch: bool,
    pub int_active_high: bool,
    pub fault_count: FaultCount,
}

impl ControlRegister {
    const QWAKE_SHIFT: u16 = 15;
    const RANGE_SHIFT: u16 = 10;
    const RANGE_MASK: u16 = 0x0F;
    const CONVERSION_TIME_SHIFT: u16 = 6;
    const CONVERSION_TIME_MASK: u16 = 0x0F;
    const OPERATION_MODE_SHIFT: u16 = 4;
    const OPERATION_MODE_MASK: u16 = 0x03;
    const LATCH_SHIFT: u16 = 3;
    const INT_POL_SHIFT: u16 = 2;
    const FAULT_COUNT_SHIFT: u16 = 0;
    const FAULT_COUNT_MASK: u16 = 0x03;

    pub fn from_word(word: u16) -> Opt4048Result<Self> {
        Ok(Self {
            quick_wake: registers::field(word, Self::QWAKE_SHIFT, 1) != 0,
            range: Range::try_from(
                registers::field(word, Self::RANGE_SHIFT, Self::RANGE_MASK) as u8,
            )?,
            conversion_time: ConversionTime::try_from(registers::field(
                word,
                Self::CONVERSION_TIME_SHIFT,
                Self::CONVERSION_TIME_MASK,
            ) as u8)?,
            operation_mode: OperationMode::try_from(registers::field(
                word,
                Self::OPERATION_MODE_SHIFT,
                Self::OPERATION_MODE_MASK,
            ) as u8)?,
            latch: registers::field(word, Self::LATCH_SHIFT, 1) != 0,
            int_active_high: registers::field(word, Self::INT_POL_SHIFT, 1) != 0,
            fault_count: FaultCount::try_from(registers::field(
                word,
                Self::FAULT_COUNT_SHIFT,
                Self::FAULT_COUNT_MASK,
            ) as u8)?,
        })
    }

    pub fn to_word(&self) -> u16 {
        ((self.quick_wake as u16) << Self::QWAKE_SHIFT)
            | ((self.range.bits() as u16 & Self::RANGE_MASK) << Self::RANGE_SHIFT)
            | ((self.conversion_time.bits() as u16 & Self::CONVERSION_TIME_MASK)
                << Self::CONVERSION_TIME_SHIFT)
            | ((self.operation_mode.bits() as u16 & Self::OPERATION_MODE_MASK)
                << Self::OPERATION_MODE_SHIFT)
            | ((self.latch as u16) << Self::LATCH_SHIFT)
            | ((self.int_active_high as u16) << Self::INT_POL_SHIFT)
            | ((self.fault_count.bits() as u16 & Self::FAULT_COUNT_MASK) << Self::FAULT_COUNT_SHIFT)
    }
}

/// Registrador 0x0B
///
/// `reservado[15:7] | THRESHOLD_CH_SEL[6:5] | INT_DIR[4] | INT_CFG[3:2]
/// | 0[1] | I2C_BURST[0]`. Os bits reservados são preservados em `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptControl {
    pub threshold_channel: ThresholdChannel,
    /// Pino INT como entrada (dispara one-shot)
    pub int_input: bool,
    pub mechanism: IntMechanism,
    pub burst: bool,
}

impl InterruptControl {
    const THRESHOLD_CH_SHIFT: u16 = 5;
    const THRESHOLD_CH_MASK: u16 = 0x03;
    const INT_DIR_SHIFT: u16 = 4;
    const INT_CFG_SHIFT: u16 = 2;
    const INT_CFG_MASK: u16 = 0x03;
    const BURST_SHIFT: u16 = 0;

    pub fn from_word(word: u16) -> Opt4048Result<Self> {
        Ok(Self {
            threshold_channel: ThresholdChannel::try_from(registers::field(
                word,
                Self::THRESHOLD_CH_SHIFT,
                Self::THRESHOLD_CH_MASK,
            ) as u8)?,
            int_input: registers::field(word, Self::INT_DIR_SHIFT, 1) != 0,
            mechanism: IntMechanism::try_from(
                registers::field(word, Self::INT_CFG_SHIFT, Self::INT_CFG_MASK) as u8,
            )?,
            burst: registers::field(word, Self::BURST_SHIFT, 1) != 0,
        })
    }

    /// Escreve os campos sobre `word`, mantendo os bits que não pertencem a eles
    pub fn apply(&self, word: u16) -> u16 {
        let word = registers::with_field(
            word,
            Self::THRESHOLD_CH_SHIFT,
            Self::THRESHOLD_CH_MASK,
            self.threshold_channel.bits() as u16,
        );
        let word = registers::with_field(word, Self::INT_DIR_SHIFT, 1, self.int_input as u16);
        let word = registers::with_field(
            word,
            Self::INT_CFG_SHIFT,
            Self::INT_CFG_MASK,
            self.mechanism.bits() as u16,
        );
        registers::with_field(word, Self::BURST_SHIFT, 1, self.burst as u16)
    }
}

/// Registrador 0x0C (somente leitura, limpo na leitura)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusFlags {
    pub overload: bool,
    pub conversion_ready: bool,
    /// Acima do limiar alto
    pub too_bright: bool,
    /// Abaixo do limiar baixo
    pub too_dim: bool,
}

impl StatusFlags {
    pub fn from_word(word: u16) -> Self {
        Self {
            overload: word & (1 << 3) != 0,
            conversion_ready: word & (1 << 2) != 0,
            too_bright: word & (1 << 1) != 0,
            too_dim: word & 1 != 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURAÇÃO DO DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuração completa do driver
///
/// ```toml
/// address = 0x44
/// byte_order = "big_endian"
/// checksum_validation = true
/// range = "auto"
/// conversion_time = "ms100"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Endereço I2C (0x44–0x47, conforme o pino ADDR)
    pub address: u8,
    pub byte_order: ByteOrder,
    /// Recalcula o checksum de cada canal; desligado por padrão
    pub checksum_validation: bool,
    /// Auto-incremento de registrador; sem ele o frame é lido registrador a registrador
    pub burst: bool,
    pub quick_wake: bool,
    pub range: Range,
    pub conversion_time: ConversionTime,
    pub operation_mode: OperationMode,
    pub latch: bool,
    pub int_active_high: bool,
    pub fault_count: FaultCount,
    pub threshold_channel: ThresholdChannel,
    pub int_mechanism: IntMechanism,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            address: ADDRESS_GND,
            byte_order: ByteOrder::BigEndian,
            checksum_validation: false,
            burst: true,
            quick_wake: false,
            range: Range::Auto,
            conversion_time: ConversionTime::Ms100,
            operation_mode: OperationMode::Continuous,
            latch: true,
            int_active_high: false,
            fault_count: FaultCount::One,
            threshold_channel: ThresholdChannel::Ch0,
            int_mechanism: IntMechanism::DataReadyAllChannels,
        }
    }
}

impl DriverConfig {
    /// Configuração para medições rápidas (1 ms por canal)
    pub fn fast() -> Self {
        Self {
            conversion_time: ConversionTime::Ms1,
            ..Self::default()
        }
    }

    /// Configuração de baixo consumo: one-shot automático, conversão longa
    pub fn low_power() -> Self {
        Self {
            operation_mode: OperationMode::AutoOneShot,
            conversion_time: ConversionTime::Ms800,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Opt4048Result<()> {
        if ![ADDRESS_GND, ADDRESS_VDD, ADDRESS_SDA, ADDRESS_SCL].contains(&self.address) {
            return Err(Opt4048Error::InvalidConfig(format!(
                "I2C address {:#04x} is not one of 0x44-0x47",
                self.address
            )));
        }
        if self.quick_wake && self.operation_mode != OperationMode::OneShot {
            return Err(Opt4048Error::InvalidConfig(
                "quick_wake only applies to one_shot mode".into(),
            ));
        }
        Ok(())
    }

    /// Parse de uma string TOML
    pub fn from_toml_str(content: &str) -> Opt4048Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Opt4048Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Carrega de um arquivo TOML
    pub fn from_file(path: &Path) -> Opt4048Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Opt4048Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Opt4048Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Opt4048Error::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn control_register(&self) -> ControlRegister {
        ControlRegister {
            quick_wake: self.quick_wake,
            range: self.range,
            conversion_time: self.conversion_time,
            operation_mode: self.operation_mode,
            latch: self.latch,
            int_active_high: self.int_active_high,
            fault_count: self.fault_count,
        }
    }

    pub fn interrupt_control(&self) -> InterruptControl {
        InterruptControl {
            threshold_channel: self.threshold_channel,
            int_input: false,
            mechanism: self.int_mechanism,
            burst: self.burst,
        }
    }
}
