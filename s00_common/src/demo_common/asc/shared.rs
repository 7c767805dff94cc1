use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal_nb::serial::{Read, Write};

use super::{Asc, AscError, AscErrors, TxInterrupt};

/// 放在全局静态量里、由主循环和中断处理函数共享的串口驱动
///
/// 每次访问驱动都只在临界区内停留很短的时间（放入/取出一个字节），
/// 等待的过程发生在临界区之外，这样串口中断才有机会运行
pub struct SharedAsc<L, const TX: usize, const RX: usize> {
    inner: Mutex<RefCell<Option<Asc<L, TX, RX>>>>,
}

impl<L, const TX: usize, const RX: usize> SharedAsc<L, TX, RX> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn install(&self, asc: Asc<L, TX, RX>) {
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace(asc);
        });
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Asc<L, TX, RX>) -> R) -> Result<R, AscError> {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref_mut(cs)
                .as_mut()
                .map(f)
                .ok_or(AscError::NotInstalled)
        })
    }
}

impl<L, const TX: usize, const RX: usize> SharedAsc<L, TX, RX>
where
    L: Read<u8> + Write<u8> + TxInterrupt,
{
    /// 把 `data` 全部放进 TX FIFO 才返回，FIFO 满的时候一直等待，没有超时
    pub fn write(&self, data: &[u8]) -> Result<(), AscError> {
        for &byte in data {
            while !self.with(|asc| asc.try_write(byte))? {
                core::hint::spin_loop();
            }
        }
        Ok(())
    }

    /// 等待 TX FIFO 中的数据全部从串口发出
    pub fn flush(&self) -> Result<(), AscError> {
        nb::block!(self.with(|asc| asc.is_tx_idle())?)
    }

    /// 一直等到收满 `buf.len()` 个字节
    pub fn read(&self, buf: &mut [u8]) -> Result<(), AscError> {
        for slot in buf.iter_mut() {
            *slot = loop {
                if let Some(byte) = self.with(|asc| asc.try_read())? {
                    break byte;
                }
                core::hint::spin_loop();
            };
        }
        Ok(())
    }

    /// 串口中断处理函数中唯一需要调用的函数
    pub fn on_interrupt(&self) {
        // 驱动还没有装好的话什么都不做
        let _ = self.with(|asc| {
            asc.isr_receive();
            asc.isr_transmit();
        });
    }

    pub fn errors(&self) -> Result<AscErrors, AscError> {
        self.with(|asc| asc.errors())
    }
}

impl<L, const TX: usize, const RX: usize> Default for SharedAsc<L, TX, RX> {
    fn default() -> Self {
        Self::new()
    }
}
