//! Mapa de registradores e layout de bits do OPT4048
//!
//! Todos os registradores têm 16 bits. Os campos são extraídos com máscaras e
//! deslocamentos explícitos; nada depende da ordem de bit-fields da plataforma.
//!
//! | Campo | Largura | Local |
//! |:------|:--------|:------|
//! | expoente | 4 | bits 15..12 do registrador alto |
//! | mantissa alta | 12 | bits 11..0 do registrador alto |
//! | mantissa baixa | 8 | bits 15..8 do registrador baixo |
//! | contador | 4 | bits 7..4 do registrador baixo |
//! | checksum | 4 | bits 3..0 do registrador baixo |

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ENDEREÇOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Expoente + mantissa alta do canal 0; os demais canais seguem de 2 em 2
pub const EXP_RES_CH0: u8 = 0x00;
pub const RES_CNT_CRC_CH0: u8 = 0x01;
pub const EXP_RES_CH1: u8 = 0x02;
pub const RES_CNT_CRC_CH1: u8 = 0x03;
pub const EXP_RES_CH2: u8 = 0x04;
pub const RES_CNT_CRC_CH2: u8 = 0x05;
pub const EXP_RES_CH3: u8 = 0x06;
pub const RES_CNT_CRC_CH3: u8 = 0x07;
pub const THRESHOLD_LOW: u8 = 0x08;
pub const THRESHOLD_HIGH: u8 = 0x09;
pub const CONTROL: u8 = 0x0A;
pub const INT_CONTROL: u8 = 0x0B;
pub const FLAGS: u8 = 0x0C;
pub const DEVICE_ID: u8 = 0x11;

/// Registradores por canal
pub const REGISTERS_PER_CHANNEL: u8 = 2;
/// Bytes por registrador
pub const REGISTER_BYTES: usize = 2;
/// Bytes de um canal (registrador alto + baixo)
pub const CHANNEL_BYTES: usize = 4;
/// Bytes do bloco dos quatro canais
pub const FRAME_BYTES: usize = 16;

/// DIDL (bits 13..12) = 0, DIDH (bits 11..0) = 0x821
pub const DEVICE_ID_VALUE: u16 = 0x0821;
pub const DEVICE_ID_MASK: u16 = 0x3FFF;

// ═══════════════════════════════════════════════════════════════════════════════
// CAMPOS DA AMOSTRA
// ═══════════════════════════════════════════════════════════════════════════════

pub const EXPONENT_SHIFT: u16 = 12;
pub const EXPONENT_WIDTH: u32 = 4;
pub const EXPONENT_MASK: u16 = 0x000F;

pub const MANTISSA_HIGH_SHIFT: u16 = 0;
pub const MANTISSA_HIGH_WIDTH: u32 = 12;
pub const MANTISSA_HIGH_MASK: u16 = 0x0FFF;

pub const MANTISSA_LOW_SHIFT: u16 = 8;
pub const MANTISSA_LOW_WIDTH: u32 = 8;
pub const MANTISSA_LOW_MASK: u16 = 0x00FF;

pub const COUNTER_SHIFT: u16 = 4;
pub const COUNTER_WIDTH: u32 = 4;
pub const COUNTER_MASK: u16 = 0x000F;

pub const CHECKSUM_SHIFT: u16 = 0;
pub const CHECKSUM_WIDTH: u32 = 4;
pub const CHECKSUM_MASK: u16 = 0x000F;

/// Mantissa completa: 20 bits
pub const MANTISSA_WIDTH: u32 = MANTISSA_HIGH_WIDTH + MANTISSA_LOW_WIDTH;
pub const MANTISSA_MAX: u32 = (1 << MANTISSA_WIDTH) - 1;

/// Extrai um campo de um registrador
#[inline]
pub const fn field(word: u16, shift: u16, mask: u16) -> u16 {
    (word >> shift) & mask
}

/// Insere um campo em um registrador, preservando os outros bits
#[inline]
pub const fn with_field(word: u16, shift: u16, mask: u16, value: u16) -> u16 {
    (word & !(mask << shift)) | ((value & mask) << shift)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDEM DE BYTES
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordem dos dois bytes de cada registrador no barramento
///
/// O OPT4048 transmite o byte mais significativo primeiro. `LittleEndian`
/// existe para transportes que já entregam as palavras invertidas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Monta uma palavra de 16 bits a partir dos bytes na ordem de transmissão
    #[inline]
    pub fn word_from_bytes(self, bytes: [u8; REGISTER_BYTES]) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes(bytes),
            Self::LittleEndian => u16::from_le_bytes(bytes),
        }
    }

    /// Serializa uma palavra de 16 bits na ordem de transmissão
    #[inline]
    pub fn word_to_bytes(self, word: u16) -> [u8; REGISTER_BYTES] {
        match self {
            Self::BigEndian => word.to_be_bytes(),
            Self::LittleEndian => word.to_le_bytes(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIMIARES
// ═══════════════════════════════════════════════════════════════════════════════

/// Os registradores de limiar comparam contra `result << (8 + exponent)`
pub const THRESHOLD_BASE_SHIFT: u32 = 8;
pub const THRESHOLD_RESULT_MASK: u16 = 0x0FFF;

/// Maior código representável em um registrador de limiar
pub const THRESHOLD_MAX: u64 =
    (THRESHOLD_RESULT_MASK as u64) << (THRESHOLD_BASE_SHIFT + EXPONENT_MASK as u32);

/// Decodifica um registrador de limiar para um código ADC
pub fn threshold_code(word: u16) -> u64 {
    let exponent = field(word, EXPONENT_SHIFT, EXPONENT_MASK) as u32;
    let result = (word & THRESHOLD_RESULT_MASK) as u64;
    result << (THRESHOLD_BASE_SHIFT + exponent)
}

/// Codifica um código ADC no menor expoente que o comporta
///
/// Bits abaixo da resolução do expoente escolhido são descartados. Códigos
/// acima de [`THRESHOLD_MAX`] saturam.
pub fn threshold_word(code: u64) -> u16 {
    let code = code.min(THRESHOLD_MAX);
    let mut exponent = 0u32;
    while (code >> (THRESHOLD_BASE_SHIFT + exponent)) > THRESHOLD_RESULT_MASK as u64 {
        exponent += 1;
    }
    let result = (code >> (THRESHOLD_BASE_SHIFT + exponent)) as u16;
    ((exponent as u16) << EXPONENT_SHIFT) | result
}
