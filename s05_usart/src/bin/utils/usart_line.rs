// 把 stm32f4xx-hal 拆分出来的 USART1 的 Tx 和 Rx 重新拼在一起，交给 s00_common 中的串口驱动
//
// 驱动只认 embedded-hal-nb 的 Read/Write trait，以及一个开关 TXE 中断的 TxInterrupt trait
// 而 HAL 的 Tx 和 Rx 是两个独立的类型，因此需要这样一层薄薄的包装

use demo_common::asc::TxInterrupt;
use embedded_hal_nb::serial::{self, ErrorKind, ErrorType};
use stm32f4xx_hal::{
    pac::USART1,
    serial::{Rx, RxListen, Tx, TxListen},
};

pub struct UsartLine {
    tx: Tx<USART1>,
    rx: Rx<USART1>,
}

impl UsartLine {
    /// 接管 Tx 和 Rx，并打开 RXNE 中断
    ///
    /// TXE 中断由驱动自己决定何时打开
    pub fn new(tx: Tx<USART1>, mut rx: Rx<USART1>) -> Self {
        rx.listen();
        Self { tx, rx }
    }
}

/// 只保留错误的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineError(ErrorKind);

impl serial::Error for LineError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

fn to_line_error<E: serial::Error>(e: nb::Error<E>) -> nb::Error<LineError> {
    e.map(|e| LineError(e.kind()))
}

impl ErrorType for UsartLine {
    type Error = LineError;
}

impl serial::Read<u8> for UsartLine {
    fn read(&mut self) -> nb::Result<u8, LineError> {
        // 读 DR 的同时，HAL 会顺带清除 ORE/FE/PE/NE 这几个错误标志
        serial::Read::read(&mut self.rx).map_err(to_line_error)
    }
}

impl serial::Write<u8> for UsartLine {
    fn write(&mut self, word: u8) -> nb::Result<(), LineError> {
        serial::Write::write(&mut self.tx, word).map_err(to_line_error)
    }

    fn flush(&mut self) -> nb::Result<(), LineError> {
        // 等待 TC 置高，也就是最后一个字节的停止位也发送完成了
        serial::Write::flush(&mut self.tx).map_err(to_line_error)
    }
}

impl TxInterrupt for UsartLine {
    fn listen_tx(&mut self) {
        self.tx.listen();
    }

    fn unlisten_tx(&mut self) {
        self.tx.unlisten();
    }
}
