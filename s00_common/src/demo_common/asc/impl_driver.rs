use embedded_hal_nb::serial::{Error, ErrorKind, Read, Write};
use heapless::spsc::Queue;

use super::{Asc, AscError, AscErrors, TxInterrupt};

impl<L, const TX: usize, const RX: usize> Asc<L, TX, RX>
where
    L: Read<u8> + Write<u8> + TxInterrupt,
{
    /// 接管串口，此时 TX 中断是关闭的
    pub fn new(mut line: L) -> Self {
        line.unlisten_tx();

        Self {
            line,
            tx_fifo: Queue::new(),
            rx_fifo: Queue::new(),
            errors: AscErrors::default(),
            tx_armed: false,
        }
    }

    /// 向 TX FIFO 放入一个字节，FIFO 满了就返回 false
    pub fn try_write(&mut self, byte: u8) -> bool {
        if self.tx_fifo.enqueue(byte).is_err() {
            return false;
        }

        // 有数据要发了，打开 TX 中断，剩下的交给 isr_transmit
        if !self.tx_armed {
            self.line.listen_tx();
            self.tx_armed = true;
        }

        true
    }

    pub fn try_read(&mut self) -> Option<u8> {
        self.rx_fifo.dequeue()
    }

    /// TX FIFO 已经清空，且串口本身也已经发完了最后一个字节
    pub fn is_tx_idle(&mut self) -> nb::Result<(), AscError> {
        if !self.tx_fifo.is_empty() {
            return Err(nb::Error::WouldBlock);
        }

        self.line.flush().map_err(|e| match e {
            nb::Error::WouldBlock => nb::Error::WouldBlock,
            nb::Error::Other(e) => nb::Error::Other(AscError::Line(e.kind())),
        })
    }

    pub fn isr_transmit(&mut self) {
        while let Some(&byte) = self.tx_fifo.peek() {
            match self.line.write(byte) {
                Ok(()) => {
                    self.tx_fifo.dequeue();
                }
                Err(nb::Error::WouldBlock) => return,
                Err(nb::Error::Other(e)) => {
                    // 这个字节没有发出去，留在 FIFO 里，下次中断再试
                    self.isr_error(e.kind());
                    return;
                }
            }
        }

        if self.tx_armed {
            self.line.unlisten_tx();
            self.tx_armed = false;
        }
    }

    pub fn isr_receive(&mut self) {
        loop {
            match self.line.read() {
                Ok(byte) => {
                    if self.rx_fifo.enqueue(byte).is_err() {
                        self.isr_error(ErrorKind::Overrun);
                    }
                }
                Err(nb::Error::WouldBlock) => return,
                Err(nb::Error::Other(e)) => {
                    self.isr_error(e.kind());
                    return;
                }
            }
        }
    }

    pub fn isr_error(&mut self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::Overrun => &mut self.errors.overrun,
            ErrorKind::FrameFormat => &mut self.errors.framing,
            ErrorKind::Parity => &mut self.errors.parity,
            ErrorKind::Noise => &mut self.errors.noise,
            _ => &mut self.errors.other,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn errors(&self) -> AscErrors {
        self.errors
    }

    pub fn tx_pending(&self) -> usize {
        self.tx_fifo.len()
    }

    pub fn rx_pending(&self) -> usize {
        self.rx_fifo.len()
    }
}
