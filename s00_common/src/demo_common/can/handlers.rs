use embedded_hal::digital::{OutputPin, StatefulOutputPin};

use crate::indicator::Indicator;

use super::{CanMessage, ACCEPTED_ID};

/// 外部总线例程的两个中断要做的事情
///
/// 每次发送完成翻转一次 LED1，每次收到 ID 为 0x60 的帧翻转一次 LED2
pub struct ExternalNodeHandlers<L1, L2> {
    tx_led: Indicator<L1>,
    rx_led: Indicator<L2>,
}

impl<L1, L2, E> ExternalNodeHandlers<L1, L2>
where
    L1: StatefulOutputPin<Error = E>,
    L2: StatefulOutputPin<Error = E>,
{
    pub fn new(tx_led: Indicator<L1>, rx_led: Indicator<L2>) -> Self {
        Self { tx_led, rx_led }
    }

    pub fn on_transmission_completed(&mut self) -> Result<(), E> {
        self.tx_led.toggle()
    }

    /// 返回这一帧是否是我们等待的那一帧
    pub fn on_message_received(&mut self, msg: &CanMessage) -> Result<bool, E> {
        if msg.message_id == ACCEPTED_ID {
            self.rx_led.toggle()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// 回环例程的两个中断要做的事情
///
/// 发送完成时点亮 LED1，收到的帧与发出的帧 ID 和数据完全一致时点亮 LED2
pub struct LoopbackNodeHandlers<L1, L2> {
    tx_led: Indicator<L1>,
    rx_led: Indicator<L2>,
    tx_msg: CanMessage,
    rx_msg: CanMessage,
}

impl<L1, L2, E> LoopbackNodeHandlers<L1, L2>
where
    L1: OutputPin<Error = E>,
    L2: OutputPin<Error = E>,
{
    pub fn new(tx_led: Indicator<L1>, rx_led: Indicator<L2>, tx_msg: CanMessage) -> Self {
        Self {
            tx_led,
            rx_led,
            tx_msg,
            rx_msg: CanMessage::invalidated(0),
        }
    }

    /// 发送前调用：作废上一次收到的内容，返回要发送的帧
    pub fn prepare_transmit(&mut self) -> CanMessage {
        self.rx_msg = CanMessage::invalidated(0);
        self.tx_msg
    }

    pub fn on_transmission_completed(&mut self) -> Result<(), E> {
        self.tx_led.turn_on()
    }

    /// 保存收到的帧，并返回它是否与发出的帧一致
    pub fn on_message_received(&mut self, msg: &CanMessage) -> Result<bool, E> {
        self.rx_msg = *msg;

        let matched = self.rx_msg.data == self.tx_msg.data
            && self.rx_msg.message_id == self.tx_msg.message_id;
        if matched {
            self.rx_led.turn_on()?;
        }
        Ok(matched)
    }

    pub fn last_received(&self) -> &CanMessage {
        &self.rx_msg
    }
}
