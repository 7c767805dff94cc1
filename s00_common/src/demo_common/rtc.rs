//! 读取 MCP79411 RTC 芯片中存储的 EUI-48 MAC 地址
//!
//! MCP79411 在 I2C 总线上有两个地址，0x6F 是 RTC/SRAM 部分，0x57 是 EEPROM 部分，
//! MAC 地址就存放在 EEPROM 受保护区域的 0xF2 ~ 0xF7 这 6 个字节中
//!
//! 读取的流程和 AT24 EEPROM 一样，先写 1 字节的地址，让芯片内部的地址指针指向 0xF2，再另起一次读操作读出 6 字节

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::i2c::{Error, ErrorKind, I2c};

pub const MCP79411_EEPROM_ADDRESS: u8 = 0x57;
pub const MAC_ADDRESS_REGISTER: u8 = 0xF2;
pub const MAC_ADDRESS_LEN: usize = 6;

/// I2C 总线的频率
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; MAC_ADDRESS_LEN]);

impl core::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// 先写寄存器地址，再读 6 字节
///
/// 每一步在芯片回 NACK 的时候都会重试（芯片可能还在忙），其它总线错误直接返回
pub fn read_mac_address<I: I2c>(i2c: &mut I) -> Result<MacAddress, I::Error> {
    retry_on_nack(|| i2c.write(MCP79411_EEPROM_ADDRESS, &[MAC_ADDRESS_REGISTER]))?;

    let mut buf = [0u8; MAC_ADDRESS_LEN];
    retry_on_nack(|| i2c.read(MCP79411_EEPROM_ADDRESS, &mut buf))?;

    Ok(MacAddress(buf))
}

fn retry_on_nack<E: Error>(mut op: impl FnMut() -> Result<(), E>) -> Result<(), E> {
    loop {
        match op() {
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => continue,
            other => return other,
        }
    }
}

/// 只能写入一次的全局变量
pub struct StoredOnce<T> {
    inner: Mutex<Cell<Option<T>>>,
}

impl<T: Copy> StoredOnce<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    /// 已经存过值的话，保留原值并返回 false
    pub fn store(&self, value: T) -> bool {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            if cell.get().is_some() {
                false
            } else {
                cell.set(Some(value));
                true
            }
        })
    }

    pub fn get(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }
}

impl<T: Copy> Default for StoredOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}
