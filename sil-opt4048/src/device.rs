//! Driver do OPT4048 sobre um [`RegisterTransport`]

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::checksum::{self, ChecksumStatus};
use crate::colorimetry::{self, CalibrationMatrix, Chromaticity, DerivedColor};
use crate::config::{
    ControlRegister, ConversionTime, DriverConfig, FaultCount, IntMechanism, InterruptControl,
    OperationMode, Range, StatusFlags, ThresholdChannel,
};
use crate::error::{Opt4048Error, Opt4048Result};
use crate::registers::{self, CHANNEL_BYTES, FRAME_BYTES, REGISTER_BYTES};
use crate::sample::{self, Channel, ChannelSample, QuadChannelFrame};
use crate::transport::{I2cTransport, RegisterTransport};

/// Um frame lido do hardware junto com o resultado do checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub frame: QuadChannelFrame,
    pub checksum: ChecksumStatus,
}

impl Measurement {
    /// Frame somente se nenhum canal divergiu
    ///
    /// Com a validação desligada (`Skipped`) o frame é devolvido como está.
    pub fn verified(self) -> Opt4048Result<QuadChannelFrame> {
        if let ChecksumStatus::Mismatch(failed) = self.checksum {
            if let Some(channel) = Channel::ALL.into_iter().find(|c| failed[c.index()]) {
                let sample = self.frame.channel(channel);
                return Err(Opt4048Error::Checksum {
                    channel,
                    transmitted: sample.checksum,
                    computed: checksum::compute_checksum(
                        sample.mantissa,
                        sample.exponent,
                        sample.counter,
                    ),
                });
            }
        }
        Ok(self.frame)
    }
}

/// Sensor triestímulo OPT4048
#[derive(Debug)]
pub struct Opt4048<T> {
    transport: T,
    config: DriverConfig,
    matrix: CalibrationMatrix,
}

impl<I: embedded_hal::i2c::I2c> Opt4048<I2cTransport<I>> {
    /// Cria o driver sobre um barramento I2C usando `config.address`
    pub fn from_i2c(i2c: I, config: DriverConfig) -> Opt4048Result<Self> {
        let address = config.address;
        Self::new(I2cTransport::new(i2c, address), config)
    }
}

impl<T: RegisterTransport> Opt4048<T> {
    /// Cria o driver; nada é escrito no dispositivo até [`Opt4048::init`]
    pub fn new(transport: T, config: DriverConfig) -> Opt4048Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            matrix: CalibrationMatrix::DATASHEET,
        })
    }

    /// Substitui a matriz de calibração (ex.: calibração própria sob um difusor)
    pub fn with_matrix(mut self, matrix: CalibrationMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn matrix(&self) -> &CalibrationMatrix {
        &self.matrix
    }

    /// Devolve o transporte
    pub fn release(self) -> T {
        self.transport
    }

    /// Confere o ID do dispositivo e aplica a configuração
    pub fn init(&mut self) -> Opt4048Result<()> {
        let id = self.device_id()?;
        if id & registers::DEVICE_ID_MASK != registers::DEVICE_ID_VALUE {
            return Err(Opt4048Error::DeviceNotFound { found: id });
        }
        self.apply_config()?;
        info!(
            address = self.config.address,
            range = ?self.config.range,
            conversion_time = ?self.config.conversion_time,
            "OPT4048 initialized"
        );
        Ok(())
    }

    pub fn device_id(&mut self) -> Opt4048Result<u16> {
        self.read_register(registers::DEVICE_ID)
    }

    /// `true` se o dispositivo responde com o ID esperado
    pub fn is_connected(&mut self) -> bool {
        matches!(
            self.device_id(),
            Ok(id) if id & registers::DEVICE_ID_MASK == registers::DEVICE_ID_VALUE
        )
    }

    /// Escreve os registradores de controle e interrupção a partir da configuração
    pub fn apply_config(&mut self) -> Opt4048Result<()> {
        let control = self.config.control_register();
        self.write_register(registers::CONTROL, control.to_word())?;

        let interrupt = self.config.interrupt_control();
        self.modify_register(registers::INT_CONTROL, |word| interrupt.apply(word))?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACESSO A REGISTRADORES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn read_register(&mut self, register: u8) -> Opt4048Result<u16> {
        let mut buf = [0u8; REGISTER_BYTES];
        self.transport.read_bytes(register, &mut buf)?;
        let word = self.config.byte_order.word_from_bytes(buf);
        debug!(register, word, "read register");
        Ok(word)
    }

    pub fn write_register(&mut self, register: u8, word: u16) -> Opt4048Result<()> {
        debug!(register, word, "write register");
        let bytes = self.config.byte_order.word_to_bytes(word);
        self.transport.write_bytes(register, &bytes)?;
        Ok(())
    }

    /// Leitura-modificação-escrita de um registrador
    pub fn modify_register<F>(&mut self, register: u8, f: F) -> Opt4048Result<u16>
    where
        F: FnOnce(u16) -> u16,
    {
        let current = self.read_register(register)?;
        let updated = f(current);
        if updated != current {
            self.write_register(register, updated)?;
        }
        Ok(updated)
    }

    /// Cópia validada da configuração com a alteração aplicada
    fn staged<F>(&self, f: F) -> Opt4048Result<DriverConfig>
    where
        F: FnOnce(&mut DriverConfig),
    {
        let mut config = self.config.clone();
        f(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn control(&mut self) -> Opt4048Result<ControlRegister> {
        ControlRegister::from_word(self.read_register(registers::CONTROL)?)
    }

    fn update_control<F>(&mut self, f: F) -> Opt4048Result<()>
    where
        F: FnOnce(&mut ControlRegister),
    {
        let mut control = self.control()?;
        f(&mut control);
        self.write_register(registers::CONTROL, control.to_word())
    }

    fn interrupt_control(&mut self) -> Opt4048Result<InterruptControl> {
        InterruptControl::from_word(self.read_register(registers::INT_CONTROL)?)
    }

    fn update_interrupt_control<F>(&mut self, f: F) -> Opt4048Result<()>
    where
        F: FnOnce(&mut InterruptControl),
    {
        let current = self.read_register(registers::INT_CONTROL)?;
        let mut interrupt = InterruptControl::from_word(current)?;
        f(&mut interrupt);
        self.write_register(registers::INT_CONTROL, interrupt.apply(current))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURAÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn set_range(&mut self, range: Range) -> Opt4048Result<()> {
        let config = self.staged(|c| c.range = range)?;
        self.update_control(|c| c.range = range)?;
        self.config = config;
        Ok(())
    }

    pub fn range(&mut self) -> Opt4048Result<Range> {
        Ok(self.control()?.range)
    }

    pub fn set_conversion_time(&mut self, time: ConversionTime) -> Opt4048Result<()> {
        let config = self.staged(|c| c.conversion_time = time)?;
        self.update_control(|c| c.conversion_time = time)?;
        self.config = config;
        Ok(())
    }

    pub fn conversion_time(&mut self) -> Opt4048Result<ConversionTime> {
        Ok(self.control()?.conversion_time)
    }

    pub fn set_operation_mode(&mut self, mode: OperationMode) -> Opt4048Result<()> {
        let config = self.staged(|c| c.operation_mode = mode)?;
        self.update_control(|c| c.operation_mode = mode)?;
        self.config = config;
        Ok(())
    }

    pub fn operation_mode(&mut self) -> Opt4048Result<OperationMode> {
        Ok(self.control()?.operation_mode)
    }

    pub fn enable_quick_wake(&mut self, enable: bool) -> Opt4048Result<()> {
        let config = self.staged(|c| c.quick_wake = enable)?;
        self.update_control(|c| c.quick_wake = enable)?;
        self.config = config;
        Ok(())
    }

    pub fn quick_wake(&mut self) -> Opt4048Result<bool> {
        Ok(self.control()?.quick_wake)
    }

    pub fn enable_latch(&mut self, enable: bool) -> Opt4048Result<()> {
        let config = self.staged(|c| c.latch = enable)?;
        self.update_control(|c| c.latch = enable)?;
        self.config = config;
        Ok(())
    }

    /// `true` em modo latch, `false` em modo transparente
    pub fn latch(&mut self) -> Opt4048Result<bool> {
        Ok(self.control()?.latch)
    }

    pub fn enable_int_active_high(&mut self, enable: bool) -> Opt4048Result<()> {
        let config = self.staged(|c| c.int_active_high = enable)?;
        self.update_control(|c| c.int_active_high = enable)?;
        self.config = config;
        Ok(())
    }

    pub fn int_active_high(&mut self) -> Opt4048Result<bool> {
        Ok(self.control()?.int_active_high)
    }

    pub fn set_fault_count(&mut self, count: FaultCount) -> Opt4048Result<()> {
        let config = self.staged(|c| c.fault_count = count)?;
        self.update_control(|c| c.fault_count = count)?;
        self.config = config;
        Ok(())
    }

    pub fn fault_count(&mut self) -> Opt4048Result<FaultCount> {
        Ok(self.control()?.fault_count)
    }

    pub fn set_threshold_channel(&mut self, channel: ThresholdChannel) -> Opt4048Result<()> {
        let config = self.staged(|c| c.threshold_channel = channel)?;
        self.update_interrupt_control(|i| i.threshold_channel = channel)?;
        self.config = config;
        Ok(())
    }

    pub fn threshold_channel(&mut self) -> Opt4048Result<ThresholdChannel> {
        Ok(self.interrupt_control()?.threshold_channel)
    }

    pub fn set_int_mechanism(&mut self, mechanism: IntMechanism) -> Opt4048Result<()> {
        let config = self.staged(|c| c.int_mechanism = mechanism)?;
        self.update_interrupt_control(|i| i.mechanism = mechanism)?;
        self.config = config;
        Ok(())
    }

    pub fn int_mechanism(&mut self) -> Opt4048Result<IntMechanism> {
        Ok(self.interrupt_control()?.mechanism)
    }

    /// Pino INT como entrada para disparar conversões one-shot
    pub fn enable_int_input(&mut self, enable: bool) -> Opt4048Result<()> {
        self.update_interrupt_control(|i| i.int_input = enable)
    }

    pub fn int_input(&mut self) -> Opt4048Result<bool> {
        Ok(self.interrupt_control()?.int_input)
    }

    /// Auto-incremento de registrador; sem ele [`Opt4048::read_frame`] faz uma
    /// leitura por registrador
    pub fn enable_burst(&mut self, enable: bool) -> Opt4048Result<()> {
        let config = self.staged(|c| c.burst = enable)?;
        self.update_interrupt_control(|i| i.burst = enable)?;
        self.config = config;
        Ok(())
    }

    /// Estado do auto-incremento lido do dispositivo
    pub fn burst(&mut self) -> Opt4048Result<bool> {
        Ok(self.interrupt_control()?.burst)
    }

    /// Liga ou desliga a verificação de checksum em software
    pub fn enable_checksum_validation(&mut self, enable: bool) {
        self.config.checksum_validation = enable;
    }

    pub fn checksum_validation_enabled(&self) -> bool {
        self.config.checksum_validation
    }

    /// Lê e limpa os flags de status
    pub fn read_flags(&mut self) -> Opt4048Result<StatusFlags> {
        Ok(StatusFlags::from_word(self.read_register(registers::FLAGS)?))
    }

    /// Define os limiares baixo e alto em códigos ADC
    pub fn set_thresholds(&mut self, low: u64, high: u64) -> Opt4048Result<()> {
        if low > high {
            return Err(Opt4048Error::InvalidConfig(format!(
                "threshold low ({}) above high ({})",
                low, high
            )));
        }
        self.write_register(registers::THRESHOLD_LOW, registers::threshold_word(low))?;
        self.write_register(registers::THRESHOLD_HIGH, registers::threshold_word(high))
    }

    /// Limiares (baixo, alto) em códigos ADC
    pub fn thresholds(&mut self) -> Opt4048Result<(u64, u64)> {
        let low = registers::threshold_code(self.read_register(registers::THRESHOLD_LOW)?);
        let high = registers::threshold_code(self.read_register(registers::THRESHOLD_HIGH)?);
        Ok((low, high))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // AMOSTRAS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Lê um único canal
    ///
    /// Leituras de canais diferentes não formam um snapshot consistente; use
    /// [`Opt4048::read_frame`] quando precisar dos quatro juntos.
    pub fn read_channel(&mut self, channel: Channel) -> Opt4048Result<ChannelSample> {
        let mut raw = [0u8; CHANNEL_BYTES];
        self.read_block(channel.base_register(), &mut raw)?;
        Ok(sample::decode_channel(&raw, self.config.byte_order))
    }

    /// Lê os quatro canais
    ///
    /// Com burst ligado é uma única transação de 16 bytes. Sem burst são oito
    /// leituras de registrador e a consistência entre canais não é garantida;
    /// compare os contadores (`counters_coherent`) para detectar mistura.
    pub fn read_frame(&mut self) -> Opt4048Result<Measurement> {
        let mut raw = [0u8; FRAME_BYTES];
        self.read_block(registers::EXP_RES_CH0, &mut raw)?;

        let frame = sample::decode_frame(&raw, self.config.byte_order);
        if !self.config.burst && !frame.counters_coherent() {
            let counters = frame.samples().map(|s| s.counter);
            warn!(?counters, "frame assembled from separate reads spans conversions");
        }

        let checksum = if self.config.checksum_validation {
            let status = ChecksumStatus::check(&frame);
            if status.is_mismatch() {
                warn!(channels = ?status.failed_channels(), "checksum mismatch");
            }
            status
        } else {
            ChecksumStatus::Skipped
        };

        Ok(Measurement { frame, checksum })
    }

    /// Registradores consecutivos a partir de `start`: uma transação com burst,
    /// uma por registrador sem ele
    fn read_block(&mut self, start: u8, buf: &mut [u8]) -> Opt4048Result<()> {
        if self.config.burst {
            self.transport.read_bytes(start, buf)?;
        } else {
            for (index, chunk) in buf.chunks_exact_mut(REGISTER_BYTES).enumerate() {
                self.transport.read_bytes(start + index as u8, chunk)?;
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COLORIMETRIA (cada chamada lê um frame novo)
    //
    // Com a validação ligada, um checksum divergente vira
    // `Opt4048Error::Checksum` em vez de um valor calculado.
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn lux(&mut self) -> Opt4048Result<f64> {
        let frame = self.read_frame()?.verified()?;
        Ok(colorimetry::compute_lux_with(&self.matrix, &frame))
    }

    pub fn chromaticity(&mut self) -> Opt4048Result<Chromaticity> {
        let frame = self.read_frame()?.verified()?;
        Ok(colorimetry::compute_chromaticity_with(&self.matrix, &frame)?)
    }

    pub fn cct(&mut self) -> Opt4048Result<f64> {
        let frame = self.read_frame()?.verified()?;
        Ok(colorimetry::compute_cct_with(&self.matrix, &frame)?)
    }

    /// Lux, cromaticidade e CCT do mesmo frame
    pub fn read_color(&mut self) -> Opt4048Result<DerivedColor> {
        let frame = self.read_frame()?.verified()?;
        Ok(colorimetry::derive_color_with(&self.matrix, &frame)?)
    }
}
