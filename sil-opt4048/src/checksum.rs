//! Verificação do checksum de 4 bits das amostras
//!
//! O sensor já calcula o checksum em hardware; recalcular aqui só serve para
//! detectar corrupção no transporte. Cada bit de saída é a paridade (XOR) de
//! um subconjunto fixo dos bits de expoente (E), mantissa (R) e contador (C):
//!
//! | Bit | Entradas |
//! |:----|:---------|
//! | 0 | todos os bits de E, R e C |
//! | 1 | C1 C3, R1 R3 … R19 (ímpares), E1 E3 |
//! | 2 | C3, R3 R7 R11 R15 R19, E3 |
//! | 3 | R3 R11 R19 |

use serde::{Deserialize, Serialize};

use crate::registers::{CHECKSUM_WIDTH, MANTISSA_MAX};
use crate::sample::{Channel, ChannelSample, QuadChannelFrame};

/// Máscaras de uma linha da tabela de paridade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParityMask {
    pub exponent: u8,
    pub mantissa: u32,
    pub counter: u8,
}

/// Tabela de paridade do datasheet, indexada pelo bit de saída
pub const CHECKSUM_BIT_MAP: [ParityMask; CHECKSUM_WIDTH as usize] = [
    ParityMask {
        exponent: 0b1111,
        mantissa: MANTISSA_MAX,
        counter: 0b1111,
    },
    ParityMask {
        exponent: 0b1010,
        mantissa: 0xAAAAA,
        counter: 0b1010,
    },
    ParityMask {
        exponent: 0b1000,
        mantissa: 0x88888,
        counter: 0b1000,
    },
    ParityMask {
        exponent: 0b0000,
        mantissa: 0x80808,
        counter: 0b0000,
    },
];

#[inline]
fn parity(mask: &ParityMask, mantissa: u32, exponent: u8, counter: u8) -> u8 {
    let ones = (mantissa & mask.mantissa).count_ones()
        + (exponent & mask.exponent).count_ones()
        + (counter & mask.counter).count_ones();
    (ones & 1) as u8
}

/// Calcula o checksum esperado para os campos de uma amostra
pub fn compute_checksum(mantissa: u32, exponent: u8, counter: u8) -> u8 {
    CHECKSUM_BIT_MAP
        .iter()
        .enumerate()
        .fold(0u8, |acc, (bit, mask)| {
            acc | (parity(mask, mantissa, exponent, counter) << bit)
        })
}

/// `true` quando o checksum transmitido confere
pub fn validate_checksum(sample: &ChannelSample) -> bool {
    compute_checksum(sample.mantissa, sample.exponent, sample.counter) == sample.checksum
}

/// Resultado da verificação de um frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStatus {
    /// Validação desabilitada na configuração
    Skipped,
    /// Os quatro canais conferem
    Verified,
    /// `true` nas posições dos canais que não conferem
    Mismatch([bool; 4]),
}

impl ChecksumStatus {
    /// Verifica os quatro canais de um frame
    pub fn check(frame: &QuadChannelFrame) -> Self {
        let failed = frame.samples().map(|s| !validate_checksum(&s));
        if failed.iter().any(|&f| f) {
            Self::Mismatch(failed)
        } else {
            Self::Verified
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }

    /// Canais com checksum divergente
    pub fn failed_channels(&self) -> Vec<Channel> {
        match self {
            Self::Mismatch(failed) => Channel::ALL
                .into_iter()
                .filter(|c| failed[c.index()])
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(mantissa: u32, exponent: u8, counter: u8) -> ChannelSample {
        ChannelSample {
            mantissa,
            exponent,
            counter,
            checksum: compute_checksum(mantissa, exponent, counter),
        }
    }

    #[test]
    fn test_zero_sample_checksum() {
        assert_eq!(compute_checksum(0, 0, 0), 0);
    }

    #[test]
    fn test_bit3_only_depends_on_r3_r11_r19() {
        // Só R3 ligado: bits 0, 1, 2 e 3 viram 1
        assert_eq!(compute_checksum(1 << 3, 0, 0), 0b1111);
        // R0: apenas a paridade total
        assert_eq!(compute_checksum(1, 0, 0), 0b0001);
        // R1: paridade total + bit 1
        assert_eq!(compute_checksum(1 << 1, 0, 0), 0b0011);
        // C3: bits 0, 1 e 2
        assert_eq!(compute_checksum(0, 0, 0b1000), 0b0111);
    }

    #[test]
    fn test_validate_sealed_sample() {
        let sample = sealed(0xBCDEF, 6, 9);
        assert!(validate_checksum(&sample));
    }

    #[test]
    fn test_validate_is_deterministic() {
        let sample = sealed(0x12345, 3, 2);
        let first = validate_checksum(&sample);
        for _ in 0..8 {
            assert_eq!(validate_checksum(&sample), first);
        }
    }

    #[test]
    fn test_every_mantissa_bit_flip_is_detected() {
        let sample = sealed(0x5A5A5, 4, 7);
        for bit in 0..20 {
            let corrupted = ChannelSample {
                mantissa: sample.mantissa ^ (1 << bit),
                ..sample
            };
            assert!(!validate_checksum(&corrupted), "bit {bit} flip went undetected");
        }
    }

    #[test]
    fn test_exponent_and_counter_flips_are_detected() {
        let sample = sealed(0x00F0F, 2, 5);
        for bit in 0..4 {
            let bad_exp = ChannelSample {
                exponent: sample.exponent ^ (1 << bit),
                ..sample
            };
            let bad_cnt = ChannelSample {
                counter: sample.counter ^ (1 << bit),
                ..sample
            };
            assert!(!validate_checksum(&bad_exp));
            assert!(!validate_checksum(&bad_cnt));
        }
    }

    #[test]
    fn test_frame_status() {
        let good = sealed(0x10000, 0, 1);
        let mut bad = sealed(0x20000, 0, 1);
        bad.checksum ^= 0b0100;

        let frame = QuadChannelFrame::new([good, bad, good, good]);
        let status = ChecksumStatus::check(&frame);
        assert!(status.is_mismatch());
        assert_eq!(status.failed_channels(), vec![Channel::Green]);

        let frame = QuadChannelFrame::new([good; 4]);
        assert_eq!(ChecksumStatus::check(&frame), ChecksumStatus::Verified);
        assert!(ChecksumStatus::Skipped.failed_channels().is_empty());
    }
}
