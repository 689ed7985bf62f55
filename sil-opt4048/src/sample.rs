//! Decodificação de amostras mantissa/expoente
//!
//! Cada canal ocupa dois registradores (4 bytes). O bloco dos quatro canais
//! (16 bytes) é lido em uma única transação para formar um [`QuadChannelFrame`].

use serde::{Deserialize, Serialize};

use crate::registers::{
    self, ByteOrder, CHANNEL_BYTES, CHECKSUM_MASK, CHECKSUM_SHIFT, COUNTER_MASK, COUNTER_SHIFT,
    EXPONENT_MASK, EXPONENT_SHIFT, FRAME_BYTES, MANTISSA_HIGH_MASK, MANTISSA_HIGH_SHIFT,
    MANTISSA_LOW_MASK, MANTISSA_LOW_SHIFT, MANTISSA_LOW_WIDTH, MANTISSA_MAX,
};

/// Canal do sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// CH0: próximo de X
    Red = 0,
    /// CH1: próximo de Y, canal fotométrico
    Green = 1,
    /// CH2: próximo de Z
    Blue = 2,
    /// CH3: banda larga, usado para detectar sobrecarga
    White = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Red, Self::Green, Self::Blue, Self::White];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Endereço do registrador alto (expoente + mantissa alta)
    #[inline]
    pub const fn base_register(self) -> u8 {
        registers::EXP_RES_CH0 + (self as u8) * registers::REGISTERS_PER_CHANNEL
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Uma leitura decodificada de um canal
///
/// Imutável depois de decodificada; cada leitura do hardware produz uma nova.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelSample {
    /// Mantissa de 20 bits
    pub mantissa: u32,
    /// Expoente de 4 bits (0–15; acima de 11 está fora da faixa do chip)
    pub exponent: u8,
    /// Contador de amostras de 4 bits
    pub counter: u8,
    /// Checksum de 4 bits transmitido
    pub checksum: u8,
}

impl ChannelSample {
    /// Maior expoente definido pelo fabricante
    pub const MAX_DEFINED_EXPONENT: u8 = 11;

    /// Monta a amostra a partir dos dois registradores já em palavras de 16 bits
    pub fn from_words(high: u16, low: u16) -> Self {
        let exponent = registers::field(high, EXPONENT_SHIFT, EXPONENT_MASK) as u8;
        let mantissa_high = registers::field(high, MANTISSA_HIGH_SHIFT, MANTISSA_HIGH_MASK) as u32;
        let mantissa_low = registers::field(low, MANTISSA_LOW_SHIFT, MANTISSA_LOW_MASK) as u32;
        let counter = registers::field(low, COUNTER_SHIFT, COUNTER_MASK) as u8;
        let checksum = registers::field(low, CHECKSUM_SHIFT, CHECKSUM_MASK) as u8;

        Self {
            mantissa: (mantissa_high << MANTISSA_LOW_WIDTH) | mantissa_low,
            exponent,
            counter,
            checksum,
        }
    }

    /// Inverso exato de [`ChannelSample::from_words`]
    pub fn to_words(&self) -> (u16, u16) {
        let mantissa = self.mantissa & MANTISSA_MAX;
        let high = registers::with_field(
            (mantissa >> MANTISSA_LOW_WIDTH) as u16,
            EXPONENT_SHIFT,
            EXPONENT_MASK,
            self.exponent as u16,
        );
        let low = ((mantissa as u16 & MANTISSA_LOW_MASK) << MANTISSA_LOW_SHIFT)
            | ((self.counter as u16 & COUNTER_MASK) << COUNTER_SHIFT)
            | (self.checksum as u16 & CHECKSUM_MASK);
        (high, low)
    }

    /// Código ADC linear: `mantissa << exponent`
    ///
    /// Precisa de até 35 bits (`0xFFFFF << 15`), por isso `u64`. Os campos
    /// são mascarados às larguras do registrador, então uma amostra montada à
    /// mão ou desserializada nunca estoura o deslocamento.
    #[inline]
    pub fn code(&self) -> u64 {
        let mantissa = (self.mantissa & MANTISSA_MAX) as u64;
        mantissa << (self.exponent as u16 & EXPONENT_MASK)
    }

    /// Expoente dentro da faixa documentada (0–11)
    #[inline]
    pub fn exponent_in_range(&self) -> bool {
        self.exponent <= Self::MAX_DEFINED_EXPONENT
    }
}

/// Decodifica os 4 bytes de um canal
pub fn decode_channel(raw: &[u8; CHANNEL_BYTES], order: ByteOrder) -> ChannelSample {
    let high = order.word_from_bytes([raw[0], raw[1]]);
    let low = order.word_from_bytes([raw[2], raw[3]]);
    ChannelSample::from_words(high, low)
}

/// Decodifica o bloco de 16 bytes dos quatro canais
pub fn decode_frame(raw: &[u8; FRAME_BYTES], order: ByteOrder) -> QuadChannelFrame {
    let mut samples = [ChannelSample::default(); 4];
    for (sample, chunk) in samples.iter_mut().zip(raw.chunks_exact(CHANNEL_BYTES)) {
        let mut block = [0u8; CHANNEL_BYTES];
        block.copy_from_slice(chunk);
        *sample = decode_channel(&block, order);
    }
    QuadChannelFrame::new(samples)
}

/// As quatro amostras de uma mesma conversão
///
/// Todas vêm da mesma leitura em bloco; nunca misture amostras de leituras
/// diferentes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuadChannelFrame {
    samples: [ChannelSample; 4],
}

impl QuadChannelFrame {
    pub fn new(samples: [ChannelSample; 4]) -> Self {
        Self { samples }
    }

    #[inline]
    pub fn channel(&self, channel: Channel) -> &ChannelSample {
        &self.samples[channel.index()]
    }

    pub fn samples(&self) -> &[ChannelSample; 4] {
        &self.samples
    }

    /// Códigos ADC na ordem dos canais
    pub fn codes(&self) -> [u64; 4] {
        self.samples.map(|s| s.code())
    }

    /// Todos os contadores iguais
    ///
    /// Uma leitura em bloco sempre satisfaz isto; leituras separadas por canal
    /// podem pegar conversões diferentes.
    pub fn counters_coherent(&self) -> bool {
        let first = self.samples[0].counter;
        self.samples.iter().all(|s| s.counter == first)
    }

    pub fn is_dark(&self) -> bool {
        self.samples.iter().all(|s| s.mantissa == 0)
    }
}
