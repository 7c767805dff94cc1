//! CAN 收发例程共用的部分
//!
//! 两个 CAN 例程发送的内容是一样的：一个标准帧，8 字节数据，按两个 32 位的字来组织
//! 区别在于，外部总线例程用 0x55 发送、只接收 0x60，而回环例程收发都使用 0x60，并且会对比整帧内容

mod config;
mod frame;
mod handlers;

pub use config::{
    CanConfigError, CanNodeConfig, FrameMode, IsrConfig, StandardFilter, SERVICED_RX_BUFFER,
    STANDARD_ID_MAX,
};
pub use frame::{from_frame, to_frame};
pub use handlers::{ExternalNodeHandlers, LoopbackNodeHandlers};

/// 外部总线例程发送时使用的 ID
pub const EXTERNAL_TX_ID: u16 = 0x55;
/// 滤波器放行的 ID，回环例程发送时也使用这个 ID
pub const ACCEPTED_ID: u16 = 0x60;

pub const TX_DATA_LOW_WORD: u32 = 0x0DEA_D007;
pub const TX_DATA_HIGH_WORD: u32 = 0xBA5E_BA11;

/// 经典 CAN 帧的最大数据长度，以 4 字节为单位
pub const MAXIMUM_CAN_DATA_PAYLOAD: usize = 2;

/// 接收缓冲在每次发送前都会被填充为这个值，这样能看出来数据是不是真的被接收到了
pub const INVALID_RX_DATA_VALUE: u8 = 0xA5;

/// 两次发送之间的间隔
pub const TX_INTERVAL_MS: u32 = 1000;

/// 500 kbit/s，PCLK1 = 16 MHz（HSI），BRP = 2，1 + 13 + 2 个 tq，采样点 87.5%
/// 数值来自 http://www.bittiming.can-wiki.info/
pub const BIT_TIMING_500K_AT_16MHZ: u32 = 0x001c_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMessage {
    /// 11 位的标准 ID
    pub message_id: u16,
    pub data: [u32; MAXIMUM_CAN_DATA_PAYLOAD],
}

impl CanMessage {
    pub const fn new(message_id: u16, data: [u32; MAXIMUM_CAN_DATA_PAYLOAD]) -> Self {
        Self { message_id, data }
    }

    /// 例程中固定发送的内容
    pub const fn demo(message_id: u16) -> Self {
        Self::new(message_id, [TX_DATA_LOW_WORD, TX_DATA_HIGH_WORD])
    }

    /// 数据部分全部填充为 INVALID_RX_DATA_VALUE
    pub const fn invalidated(message_id: u16) -> Self {
        let word = u32::from_ne_bytes([INVALID_RX_DATA_VALUE; 4]);
        Self::new(message_id, [word; MAXIMUM_CAN_DATA_PAYLOAD])
    }

    /// 按小端序把两个字展开为 8 个字节，低位字在前
    pub fn to_bytes(&self) -> [u8; MAXIMUM_CAN_DATA_PAYLOAD * 4] {
        let mut bytes = [0u8; MAXIMUM_CAN_DATA_PAYLOAD * 4];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.data.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// `to_bytes` 的反向操作，不足 8 字节时，缺少的部分保持 INVALID_RX_DATA_VALUE，多余的字节被忽略
    pub fn from_bytes(message_id: u16, bytes: &[u8]) -> Self {
        let mut raw = [INVALID_RX_DATA_VALUE; MAXIMUM_CAN_DATA_PAYLOAD * 4];
        let len = bytes.len().min(raw.len());
        raw[..len].copy_from_slice(&bytes[..len]);

        let mut data = [0u32; MAXIMUM_CAN_DATA_PAYLOAD];
        for (word, chunk) in data.iter_mut().zip(raw.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Self { message_id, data }
    }
}

/// 反复尝试发送，直到 CAN 控制器接受了这一帧
///
/// `attempt` 返回 `WouldBlock` 表示发送邮箱都满了（not sent, busy），此时会一直重试，没有超时
pub fn send_until_accepted<T, E>(mut attempt: impl FnMut() -> nb::Result<T, E>) -> Result<T, E> {
    nb::block!(attempt())
}
