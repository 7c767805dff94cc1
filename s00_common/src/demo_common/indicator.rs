//! 状态指示灯
//!
//! 板上的 LED 都是低电平点亮的，因此这里把“亮/灭”和引脚电平的关系包装了一下，
//! 免得在每个中断处理函数里都要记住 set_low 才是点亮

use embedded_hal::digital::{OutputPin, StatefulOutputPin};

/// 一个推挽输出引脚的描述：(port, index)，仅用于在启动时打印引脚信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinDescriptor {
    pub port: char,
    pub index: u8,
}

impl core::fmt::Display for PinDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{}{} (push-pull)", self.port, self.index)
    }
}

/// 发送完成指示灯
pub const LED1: PinDescriptor = PinDescriptor {
    port: 'C',
    index: 13,
};

/// 接收成功指示灯
pub const LED2: PinDescriptor = PinDescriptor {
    port: 'C',
    index: 14,
};

/// CAN 收发器的 STB（standby）引脚，拉低后收发器才会工作
pub const CAN_STB: PinDescriptor = PinDescriptor {
    port: 'B',
    index: 0,
};

/// 低电平点亮的 LED
pub struct Indicator<P> {
    pin: P,
}

impl<P: OutputPin> Indicator<P> {
    /// 接管引脚，并先熄灭 LED
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_high()?;
        Ok(Self { pin })
    }

    pub fn turn_on(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()
    }

    pub fn turn_off(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()
    }
}

impl<P: StatefulOutputPin> Indicator<P> {
    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.pin.toggle()
    }

    pub fn is_on(&mut self) -> Result<bool, P::Error> {
        self.pin.is_set_low()
    }
}
