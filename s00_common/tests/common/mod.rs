//! 测试用的假引脚、假 I2C 总线、假串口

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, convert::Infallible, rc::Rc};

use demo_common::asc::TxInterrupt;

// ---------------------------------------------------------------- 引脚

#[derive(Debug, Default)]
pub struct PinLog {
    pub high: bool,
    pub toggles: u32,
    pub writes: u32,
}

#[derive(Clone, Default)]
pub struct FakePin {
    pub log: Rc<RefCell<PinLog>>,
}

impl FakePin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.log.borrow().high
    }

    pub fn toggles(&self) -> u32 {
        self.log.borrow().toggles
    }
}

impl embedded_hal::digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut log = self.log.borrow_mut();
        log.high = false;
        log.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut log = self.log.borrow_mut();
        log.high = true;
        log.writes += 1;
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.log.borrow().high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.log.borrow().high)
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        let mut log = self.log.borrow_mut();
        log.high = !log.high;
        log.toggles += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------- I2C

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeI2cError(pub embedded_hal::i2c::ErrorKind);

impl embedded_hal::i2c::Error for FakeI2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        self.0
    }
}

/// 按顺序给出每一次读/写的结果
pub enum Reply {
    Ack,
    Nack,
    Fail(embedded_hal::i2c::ErrorKind),
    Data(Vec<u8>),
}

#[derive(Default)]
pub struct FakeI2c {
    pub replies: VecDeque<Reply>,
    pub ops: Vec<BusOp>,
}

impl FakeI2c {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ops: Vec::new(),
        }
    }
}

impl embedded_hal::i2c::ErrorType for FakeI2c {
    type Error = FakeI2cError;
}

impl embedded_hal::i2c::I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), FakeI2cError> {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};

        for op in operations.iter_mut() {
            let reply = self
                .replies
                .pop_front()
                .expect("bus accessed more often than scripted");

            match op {
                Operation::Write(bytes) => self.ops.push(BusOp::Write(address, bytes.to_vec())),
                Operation::Read(buf) => self.ops.push(BusOp::Read(address, buf.len())),
            }

            match reply {
                Reply::Ack => {}
                Reply::Nack => {
                    return Err(FakeI2cError(ErrorKind::NoAcknowledge(
                        NoAcknowledgeSource::Address,
                    )))
                }
                Reply::Fail(kind) => return Err(FakeI2cError(kind)),
                Reply::Data(data) => {
                    if let Operation::Read(buf) = op {
                        buf.copy_from_slice(&data);
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------- 串口

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeSerialError(pub embedded_hal_nb::serial::ErrorKind);

impl embedded_hal_nb::serial::Error for FakeSerialError {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct LineLog {
    pub sent: Vec<u8>,
    pub incoming: VecDeque<Result<u8, FakeSerialError>>,
    /// 串口在 WouldBlock 之前还能接受几个字节，每次中断前由测试重新设置
    pub tx_room: usize,
    pub listening_tx: bool,
}

#[derive(Clone, Default)]
pub struct FakeLine {
    pub log: Rc<RefCell<LineLog>>,
}

impl FakeLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tx_room(self, room: usize) -> Self {
        self.log.borrow_mut().tx_room = room;
        self
    }

    pub fn set_tx_room(&self, room: usize) {
        self.log.borrow_mut().tx_room = room;
    }

    pub fn push_incoming(&self, bytes: &[u8]) {
        self.log
            .borrow_mut()
            .incoming
            .extend(bytes.iter().map(|&b| Ok(b)));
    }

    pub fn push_error(&self, kind: embedded_hal_nb::serial::ErrorKind) {
        self.log
            .borrow_mut()
            .incoming
            .push_back(Err(FakeSerialError(kind)));
    }

    pub fn sent(&self) -> Vec<u8> {
        self.log.borrow().sent.clone()
    }

    pub fn listening_tx(&self) -> bool {
        self.log.borrow().listening_tx
    }
}

impl embedded_hal_nb::serial::ErrorType for FakeLine {
    type Error = FakeSerialError;
}

impl embedded_hal_nb::serial::Read<u8> for FakeLine {
    fn read(&mut self) -> nb::Result<u8, FakeSerialError> {
        match self.log.borrow_mut().incoming.pop_front() {
            Some(Ok(byte)) => Ok(byte),
            Some(Err(e)) => Err(nb::Error::Other(e)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

impl embedded_hal_nb::serial::Write<u8> for FakeLine {
    fn write(&mut self, word: u8) -> nb::Result<(), FakeSerialError> {
        let mut log = self.log.borrow_mut();
        if log.tx_room == 0 {
            return Err(nb::Error::WouldBlock);
        }
        log.tx_room -= 1;
        log.sent.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), FakeSerialError> {
        Ok(())
    }
}

impl TxInterrupt for FakeLine {
    fn listen_tx(&mut self) {
        self.log.borrow_mut().listening_tx = true;
    }

    fn unlisten_tx(&mut self) {
        self.log.borrow_mut().listening_tx = false;
    }
}
