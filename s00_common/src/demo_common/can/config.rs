use crate::priority::{IsrPriority, ISR_PRIORITY_CAN_RX, ISR_PRIORITY_CAN_TX};

use super::ACCEPTED_ID;

/// 标准帧 ID 只有 11 位
pub const STANDARD_ID_MAX: u16 = 0x7FF;

/// 例程只为 0 号接收缓冲准备了中断处理函数
pub const SERVICED_RX_BUFFER: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanConfigError {
    /// 滤波器的 ID 超出了 11 位
    FilterIdNotStandard(u16),
    /// 滤波器把帧存进了一个没有中断处理函数的接收缓冲，这些帧永远不会被读走
    RxBufferNotServiced(u8),
}

/// 节点负责的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Transmit,
    Receive,
    TransmitAndReceive,
}

impl FrameMode {
    pub fn transmits(self) -> bool {
        matches!(self, FrameMode::Transmit | FrameMode::TransmitAndReceive)
    }

    pub fn receives(self) -> bool {
        matches!(self, FrameMode::Receive | FrameMode::TransmitAndReceive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsrConfig {
    pub priority: IsrPriority,
}

/// 标准帧（11 位 ID）滤波器，匹配 `id` 的帧会被存入 `rx_buffer` 号接收缓冲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFilter {
    pub number: u8,
    pub id: u16,
    pub rx_buffer: u8,
}

impl StandardFilter {
    pub fn accepts(&self, id: u16) -> bool {
        self.id == id
    }
}

/// CAN 节点的配置
///
/// 在初始化函数里填好，交给初始化流程之后就不再修改了
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanNodeConfig {
    pub frame: FrameMode,
    pub bus_loopback: bool,
    pub bit_timing: u32,
    pub transmission_completed: Option<IsrConfig>,
    pub message_stored: Option<IsrConfig>,
    pub filter: Option<StandardFilter>,
}

impl CanNodeConfig {
    /// 默认配置：只发送，不回环，不开中断，不设滤波器
    pub const fn new(bit_timing: u32) -> Self {
        Self {
            frame: FrameMode::Transmit,
            bus_loopback: false,
            bit_timing,
            transmission_completed: None,
            message_stored: None,
            filter: None,
        }
    }

    pub const fn with_frame(mut self, frame: FrameMode) -> Self {
        self.frame = frame;
        self
    }

    pub const fn with_bus_loopback(mut self, enabled: bool) -> Self {
        self.bus_loopback = enabled;
        self
    }

    pub const fn with_transmission_completed(mut self, isr: IsrConfig) -> Self {
        self.transmission_completed = Some(isr);
        self
    }

    pub const fn with_message_stored(mut self, isr: IsrConfig) -> Self {
        self.message_stored = Some(isr);
        self
    }

    pub const fn with_filter(mut self, filter: StandardFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// 外部总线例程：同一个节点既发送也接收，只放行 0x60
    pub const fn external_node(bit_timing: u32) -> Self {
        Self::new(bit_timing)
            .with_frame(FrameMode::TransmitAndReceive)
            .with_transmission_completed(IsrConfig {
                priority: ISR_PRIORITY_CAN_TX,
            })
            .with_message_stored(IsrConfig {
                priority: ISR_PRIORITY_CAN_RX,
            })
            .with_filter(StandardFilter {
                number: 0,
                id: ACCEPTED_ID,
                rx_buffer: SERVICED_RX_BUFFER,
            })
    }

    /// 回环例程：节点的发送直接回到自己的接收端，不经过外部引脚
    pub const fn loopback_node(bit_timing: u32) -> Self {
        Self::external_node(bit_timing).with_bus_loopback(true)
    }

    /// 在交给硬件之前检查配置
    pub fn check(&self) -> Result<(), CanConfigError> {
        if let Some(filter) = self.filter {
            if filter.id > STANDARD_ID_MAX {
                return Err(CanConfigError::FilterIdNotStandard(filter.id));
            }
            if filter.rx_buffer != SERVICED_RX_BUFFER {
                return Err(CanConfigError::RxBufferNotServiced(filter.rx_buffer));
            }
        }
        Ok(())
    }
}
