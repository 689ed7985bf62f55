//! Transporte de registradores
//!
//! O driver só precisa de "ler N bytes a partir do registrador X" e "escrever
//! N bytes a partir do registrador X". Qualquer barramento que forneça isso
//! implementa [`RegisterTransport`]; [`I2cTransport`] cobre o caso comum de um
//! `embedded_hal::i2c::I2c`.
//!
//! Se vários threads compartilham o mesmo barramento, o par endereço→dados de
//! cada chamada precisa ser uma seção crítica do lado de quem implementa.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::error::BusError;

/// Pino ADDR ligado ao GND
pub const ADDRESS_GND: u8 = 0x44;
/// Pino ADDR ligado ao VDD
pub const ADDRESS_VDD: u8 = 0x45;
/// Pino ADDR ligado ao SDA
pub const ADDRESS_SDA: u8 = 0x46;
/// Pino ADDR ligado ao SCL
pub const ADDRESS_SCL: u8 = 0x47;

/// Acesso em bytes a registradores do dispositivo
pub trait RegisterTransport {
    /// Preenche `buf` com os bytes a partir de `offset`
    ///
    /// Uma chamada é uma única transação; o bloco inteiro reflete o mesmo
    /// instante do dispositivo.
    fn read_bytes(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Escreve `data` a partir de `offset`
    fn write_bytes(&mut self, offset: u8, data: &[u8]) -> Result<(), BusError>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for &mut T {
    fn read_bytes(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).read_bytes(offset, buf)
    }

    fn write_bytes(&mut self, offset: u8, data: &[u8]) -> Result<(), BusError> {
        (**self).write_bytes(offset, data)
    }
}

/// Transporte sobre um barramento I2C do embedded-hal
#[derive(Debug)]
pub struct I2cTransport<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> I2cTransport<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Devolve o barramento
    pub fn release(self) -> I {
        self.i2c
    }

    fn map_error(&self, kind: ErrorKind) -> BusError {
        match kind {
            ErrorKind::NoAcknowledge(_) => BusError::Nack {
                address: self.address,
            },
            other => BusError::Transfer(format!("{:?}", other)),
        }
    }
}

impl<I: I2c> RegisterTransport for I2cTransport<I> {
    fn read_bytes(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(self.address, &[offset], buf)
            .map_err(|e| self.map_error(e.kind()))
    }

    fn write_bytes(&mut self, offset: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(offset);
        frame.extend_from_slice(data);
        self.i2c
            .write(self.address, &frame)
            .map_err(|e| self.map_error(e.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn test_read_bytes_is_single_write_read() {
        let expectations = [I2cTransaction::write_read(
            ADDRESS_GND,
            vec![0x00],
            (0u8..16).collect(),
        )];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), ADDRESS_GND);

        let mut buf = [0u8; 16];
        transport.read_bytes(0x00, &mut buf).unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[15], 15);

        transport.release().done();
    }

    #[test]
    fn test_write_bytes_prefixes_offset() {
        let expectations = [I2cTransaction::write(ADDRESS_VDD, vec![0x0A, 0x32, 0x08])];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), ADDRESS_VDD);

        transport.write_bytes(0x0A, &[0x32, 0x08]).unwrap();

        transport.release().done();
    }

    #[test]
    fn test_nack_maps_to_bus_error() {
        let expectations = [I2cTransaction::write_read(ADDRESS_SDA, vec![0x11], vec![0x00, 0x00])
            .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), ADDRESS_SDA);

        let mut buf = [0u8; 2];
        let err = transport.read_bytes(0x11, &mut buf).unwrap_err();
        assert_eq!(err, BusError::Nack { address: ADDRESS_SDA });

        transport.release().done();
    }

    #[test]
    fn test_other_errors_map_to_transfer() {
        let expectations = [I2cTransaction::write(ADDRESS_SCL, vec![0x0B, 0x80, 0x11])
            .with_error(ErrorKind::ArbitrationLoss)];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), ADDRESS_SCL);

        let err = transport.write_bytes(0x0B, &[0x80, 0x11]).unwrap_err();
        assert!(matches!(err, BusError::Transfer(_)));

        transport.release().done();
    }
}
