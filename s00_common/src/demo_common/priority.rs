//! 中断优先级
//!
//! 这个项目里的中断优先级一律是“数字越大越优先”，而 Cortex-M 的 NVIC 恰好相反，数字越小越优先，
//! 而且 STM32F4 的 NVIC 只实现了 8 位优先级寄存器中的高 4 位
//! 所以用 IsrPriority 记录“数字越大越优先”的值，在写入 NVIC 之前再做转换

/// NVIC 实际实现的优先级位数
pub const NVIC_PRIO_BITS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsrPriority(pub u8);

impl IsrPriority {
    /// 可以区分的最高优先级，更高的值会被压到这一级
    pub const MAX: IsrPriority = IsrPriority((1 << NVIC_PRIO_BITS) - 1);

    /// 转换为可以直接写入 NVIC IPR 寄存器的值
    pub const fn to_nvic(self) -> u8 {
        let max = Self::MAX.0;
        let level = if self.0 > max { max } else { self.0 };
        (max - level) << (8 - NVIC_PRIO_BITS)
    }
}

pub const ISR_PRIORITY_CAN_TX: IsrPriority = IsrPriority(2);
pub const ISR_PRIORITY_CAN_RX: IsrPriority = IsrPriority(1);

pub const ISR_PRIORITY_ASCLIN_TX: IsrPriority = IsrPriority(19);
pub const ISR_PRIORITY_ASCLIN_RX: IsrPriority = IsrPriority(18);
pub const ISR_PRIORITY_ASCLIN_ER: IsrPriority = IsrPriority(20);
