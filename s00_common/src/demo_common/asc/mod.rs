//! 基于中断和软件 FIFO 的串口驱动
//!
//! 主循环只和两个软件 FIFO 打交道：写数据就是往 TX FIFO 里放字节，读数据就是从 RX FIFO 里取字节
//! 真正和串口硬件交互的是中断处理函数：
//!
//! - TX 中断（发送寄存器为空）触发时，`isr_transmit` 把 TX FIFO 中的字节一个一个搬进串口，直到串口忙或 FIFO 空了，
//!   FIFO 空了之后就关闭 TX 中断，否则“发送寄存器为空”这个状态会让中断一直触发
//! - RX 中断（接收寄存器非空）触发时，`isr_receive` 把串口中的字节搬进 RX FIFO，搬不下的字节记为 overrun
//! - 串口报告的错误（溢出、帧错误、校验错误、噪声）交给 `isr_error` 计数
//!
//! STM32 的 USART 只有一个中断向量，所以 `SharedAsc::on_interrupt` 会把接收和发送都处理一遍

mod impl_driver;
mod shared;

use embedded_hal_nb::serial::ErrorKind;
use heapless::spsc::Queue;

use crate::priority::{
    IsrPriority, ISR_PRIORITY_ASCLIN_ER, ISR_PRIORITY_ASCLIN_RX, ISR_PRIORITY_ASCLIN_TX,
};

pub use shared::SharedAsc;

/// 每次循环发送的应答字符串
pub const ACK_TEXT: &[u8] = b"Transfer completed\r\n";
pub const ACK_TEXT_LENGTH: usize = ACK_TEXT.len();

/// 收到这个字符之后才发送应答（仅 s05c02 使用）
pub const PASS_CHARACTER: u8 = b'1';
/// 等待前用来清空接收变量的值
pub const RESET_CHARACTER: u8 = 0;

/// 软件 FIFO 的容量，heapless 的 spsc::Queue 实际可用的容量要少 1
pub const ASC_TX_BUFFER_SIZE: usize = 64;
pub const ASC_RX_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AscConfig {
    pub baudrate: u32,
    pub tx_priority: IsrPriority,
    pub rx_priority: IsrPriority,
    pub er_priority: IsrPriority,
}

impl AscConfig {
    /// 一个中断向量要同时服务收、发、错误的时候，取三者中最高的优先级
    pub fn shared_priority(&self) -> IsrPriority {
        self.tx_priority.max(self.rx_priority).max(self.er_priority)
    }
}

impl Default for AscConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            tx_priority: ISR_PRIORITY_ASCLIN_TX,
            rx_priority: ISR_PRIORITY_ASCLIN_RX,
            er_priority: ISR_PRIORITY_ASCLIN_ER,
        }
    }
}

/// 控制“发送寄存器为空”中断的开关
pub trait TxInterrupt {
    fn listen_tx(&mut self);
    fn unlisten_tx(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscError {
    /// 驱动还没有通过 `SharedAsc::install` 放进全局变量
    NotInstalled,
    /// 串口在 flush 时报告的错误
    Line(ErrorKind),
}

/// 各类串口错误出现的次数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AscErrors {
    pub overrun: u32,
    pub framing: u32,
    pub parity: u32,
    pub noise: u32,
    pub other: u32,
}

impl AscErrors {
    pub fn total(&self) -> u32 {
        self.overrun
            .saturating_add(self.framing)
            .saturating_add(self.parity)
            .saturating_add(self.noise)
            .saturating_add(self.other)
    }
}

pub struct Asc<L, const TX: usize, const RX: usize> {
    line: L,
    tx_fifo: Queue<u8, TX>,
    rx_fifo: Queue<u8, RX>,
    errors: AscErrors,
    tx_armed: bool,
}
