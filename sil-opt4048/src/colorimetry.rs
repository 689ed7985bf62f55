//! Motor de colorimetria: lux, cromaticidade CIE 1931 e CCT
//!
//! Converte os códigos ADC de um [`QuadChannelFrame`] em grandezas derivadas
//! usando a matriz de calibração do datasheet (seção 9.2.4). Toda a aritmética
//! é feita em `f64`; os códigos continuam inteiros até este ponto.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::sample::{Channel, QuadChannelFrame};

/// Coluna da matriz com o fator de lux
pub const LUX_COLUMN: usize = 3;

/// Canal fotométrico usado para lux
pub const LUX_CHANNEL: Channel = Channel::Green;

/// Canais que entram na soma triestímulo; CH3 fica de fora
pub const TRISTIMULUS_CHANNELS: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

/// Coeficientes do polinômio de McCamy
pub const MCCAMY_X_E: f64 = 0.3320;
pub const MCCAMY_Y_E: f64 = 0.1858;
const MCCAMY_COEFFICIENTS: [f64; 4] = [437.0, 3601.0, 6861.0, 5517.0];

/// Matriz 4x4: linhas = canais, colunas = X, Y, Z, lux
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMatrix {
    pub coefficients: [[f64; 4]; 4],
}

impl CalibrationMatrix {
    /// Tabela do datasheet do OPT4048
    pub const DATASHEET: Self = Self {
        coefficients: [
            [2.34892992e-4, -1.89652390e-5, 1.20811684e-5, 0.0],
            [4.07467441e-5, 1.98958202e-4, -1.58848115e-5, 2.15e-3],
            [9.28619404e-5, -1.69739553e-5, 6.74021520e-4, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ],
    };

    pub const fn new(coefficients: [[f64; 4]; 4]) -> Self {
        Self { coefficients }
    }

    #[inline]
    pub fn get(&self, channel: Channel, column: usize) -> f64 {
        self.coefficients[channel.index()][column]
    }

    /// Fator de conversão código → lux
    #[inline]
    pub fn lux_factor(&self) -> f64 {
        self.get(LUX_CHANNEL, LUX_COLUMN)
    }
}

impl Default for CalibrationMatrix {
    fn default() -> Self {
        Self::DATASHEET
    }
}

/// Matriz de calibração global, somente leitura
pub static CIE_MATRIX: CalibrationMatrix = CalibrationMatrix::DATASHEET;

/// Valores triestímulo CIE (X, Y, Z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tristimulus {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Tristimulus {
    #[inline]
    pub fn sum(&self) -> f64 {
        self.x + self.y + self.z
    }

    /// Projeção normalizada (x, y)
    pub fn chromaticity(&self) -> Result<Chromaticity, DomainError> {
        let sum = self.sum();
        if sum == 0.0 || !sum.is_finite() {
            return Err(DomainError::ZeroTristimulus);
        }
        Ok(Chromaticity {
            x: self.x / sum,
            y: self.y / sum,
        })
    }
}

/// Coordenadas de cromaticidade CIE 1931
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
}

impl Chromaticity {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Terceira coordenada implícita, `1 - x - y`
    #[inline]
    pub fn z(&self) -> f64 {
        1.0 - self.x - self.y
    }
}

/// Grandezas derivadas de um frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedColor {
    pub lux: f64,
    pub chromaticity: Chromaticity,
    /// Temperatura de cor correlata em Kelvin
    pub cct: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CÁLCULOS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn compute_lux_with(matrix: &CalibrationMatrix, frame: &QuadChannelFrame) -> f64 {
    frame.channel(LUX_CHANNEL).code() as f64 * matrix.lux_factor()
}

pub fn compute_tristimulus_with(matrix: &CalibrationMatrix, frame: &QuadChannelFrame) -> Tristimulus {
    let mut xyz = [0.0f64; 3];
    for channel in TRISTIMULUS_CHANNELS {
        let code = frame.channel(channel).code() as f64;
        for (column, acc) in xyz.iter_mut().enumerate() {
            *acc += code * matrix.get(channel, column);
        }
    }
    Tristimulus {
        x: xyz[0],
        y: xyz[1],
        z: xyz[2],
    }
}

pub fn compute_chromaticity_with(
    matrix: &CalibrationMatrix,
    frame: &QuadChannelFrame,
) -> Result<Chromaticity, DomainError> {
    compute_tristimulus_with(matrix, frame).chromaticity()
}

pub fn compute_cct_with(matrix: &CalibrationMatrix, frame: &QuadChannelFrame) -> Result<f64, DomainError> {
    mccamy_cct(compute_chromaticity_with(matrix, frame)?)
}

pub fn derive_color_with(
    matrix: &CalibrationMatrix,
    frame: &QuadChannelFrame,
) -> Result<DerivedColor, DomainError> {
    let chromaticity = compute_chromaticity_with(matrix, frame)?;
    Ok(DerivedColor {
        lux: compute_lux_with(matrix, frame),
        chromaticity,
        cct: mccamy_cct(chromaticity)?,
    })
}

/// Iluminância em lux com a matriz do datasheet
pub fn compute_lux(frame: &QuadChannelFrame) -> f64 {
    compute_lux_with(&CIE_MATRIX, frame)
}

pub fn compute_tristimulus(frame: &QuadChannelFrame) -> Tristimulus {
    compute_tristimulus_with(&CIE_MATRIX, frame)
}

/// Cromaticidade (x, y); `ZeroTristimulus` quando X + Y + Z == 0
pub fn compute_chromaticity(frame: &QuadChannelFrame) -> Result<Chromaticity, DomainError> {
    compute_chromaticity_with(&CIE_MATRIX, frame)
}

/// CCT em Kelvin pela aproximação de McCamy
pub fn compute_cct(frame: &QuadChannelFrame) -> Result<f64, DomainError> {
    compute_cct_with(&CIE_MATRIX, frame)
}

pub fn derive_color(frame: &QuadChannelFrame) -> Result<DerivedColor, DomainError> {
    derive_color_with(&CIE_MATRIX, frame)
}

/// Aproximação de McCamy: `n = (x - 0.3320) / (0.1858 - y)`
///
/// O erro fica em torno de ±2% perto do locus da luz do dia.
pub fn mccamy_cct(chromaticity: Chromaticity) -> Result<f64, DomainError> {
    let denominator = MCCAMY_Y_E - chromaticity.y;
    if denominator == 0.0 || !chromaticity.x.is_finite() || !chromaticity.y.is_finite() {
        return Err(DomainError::CctUndefined { y: chromaticity.y });
    }
    let n = (chromaticity.x - MCCAMY_X_E) / denominator;
    // Horner: ((a·n + b)·n + c)·n + d
    let cct = MCCAMY_COEFFICIENTS
        .iter()
        .fold(0.0, |acc, &coefficient| acc * n + coefficient);
    if !cct.is_finite() {
        return Err(DomainError::CctUndefined { y: chromaticity.y });
    }
    Ok(cct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::ChannelSample;

    fn frame_from_codes(mantissas: [u32; 4]) -> QuadChannelFrame {
        QuadChannelFrame::new(mantissas.map(|mantissa| ChannelSample {
            mantissa,
            ..ChannelSample::default()
        }))
    }

    #[test]
    fn test_lux_uses_green_channel_only() {
        let frame = frame_from_codes([1000, 2000, 3000, 4000]);
        assert_eq!(compute_lux(&frame), 2000.0 * 2.15e-3);
    }

    #[test]
    fn test_white_channel_ignored_by_tristimulus() {
        let a = frame_from_codes([1000, 2000, 3000, 0]);
        let b = frame_from_codes([1000, 2000, 3000, 0xFFFFF]);
        assert_eq!(compute_tristimulus(&a), compute_tristimulus(&b));
    }

    #[test]
    fn test_chromaticity_normalization() {
        let frame = frame_from_codes([52_000, 61_000, 40_000, 90_000]);
        let xyz = compute_tristimulus(&frame);
        let c = compute_chromaticity(&frame).unwrap();
        let z = xyz.z / xyz.sum();
        assert!((c.x + c.y + z - 1.0).abs() < 1e-12);
        assert!((c.z() - z).abs() < 1e-12);
    }

    #[test]
    fn test_dark_frame_is_domain_error() {
        let frame = frame_from_codes([0, 0, 0, 0]);
        assert_eq!(compute_chromaticity(&frame), Err(DomainError::ZeroTristimulus));
        assert_eq!(compute_cct(&frame), Err(DomainError::ZeroTristimulus));
        assert!(derive_color(&frame).is_err());
        // lux continua definido
        assert_eq!(compute_lux(&frame), 0.0);
    }

    #[test]
    fn test_mccamy_d65() {
        let cct = mccamy_cct(Chromaticity::new(0.3127, 0.3290)).unwrap();
        assert!((cct - 6500.0).abs() < 6500.0 * 0.02, "cct = {cct}");
    }

    #[test]
    fn test_mccamy_illuminant_a() {
        // Iluminante A ≈ 2856 K
        let cct = mccamy_cct(Chromaticity::new(0.44757, 0.40745)).unwrap();
        assert!((cct - 2856.0).abs() < 2856.0 * 0.02, "cct = {cct}");
    }

    #[test]
    fn test_mccamy_singular_point() {
        let result = mccamy_cct(Chromaticity::new(0.3, MCCAMY_Y_E));
        assert!(matches!(result, Err(DomainError::CctUndefined { .. })));
    }

    #[test]
    fn test_custom_matrix() {
        let mut coefficients = [[0.0; 4]; 4];
        coefficients[0][0] = 1.0;
        coefficients[1][1] = 1.0;
        coefficients[2][2] = 1.0;
        coefficients[1][3] = 0.5;
        let matrix = CalibrationMatrix::new(coefficients);

        let frame = frame_from_codes([10, 20, 70, 0]);
        assert_eq!(compute_lux_with(&matrix, &frame), 10.0);
        let c = compute_chromaticity_with(&matrix, &frame).unwrap();
        assert!((c.x - 0.1).abs() < 1e-12);
        assert!((c.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_derive_color() {
        let frame = frame_from_codes([40_000, 45_000, 30_000, 0]);
        let color = derive_color(&frame).unwrap();
        assert_eq!(color.lux, compute_lux(&frame));
        assert_eq!(color.chromaticity, compute_chromaticity(&frame).unwrap());
        assert_eq!(color.cct, compute_cct(&frame).unwrap());
    }
}
