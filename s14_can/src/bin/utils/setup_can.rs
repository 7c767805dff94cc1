// 按照 CanNodeConfig 配置 bxCAN
//
// bxCAN 的配置分为三步：
//
// 1. 在初始化模式下设置位时序，以及是否回环、是否静默，然后退出初始化模式
//    退出时 bxCAN 需要在 RX 引脚上检测到 11 个连续的隐性位，才算与总线同步，enable 会一直等待同步完成
// 2. 设置滤波器，bxCAN 的滤波器是和 CAN2 共享的，它们归 CAN1 所有
// 3. 打开需要的中断
//
// 这几步都应该在临界区中完成，以免配置到一半，中断就先触发了
//
// 例程只有 CAN1_RX0 一个接收中断处理函数，所以滤波器只能把帧存进 FIFO 0，
// 其它配置在碰到硬件之前就会被 CanNodeConfig::check 拒绝

use bxcan::{filter::Mask32, Fifo, Interrupts, StandardId};
use demo_common::can::{CanConfigError, CanNodeConfig};
use stm32f4xx_hal::{can::Can, pac::CAN1};

pub type Can1 = bxcan::Can<Can<CAN1>>;

pub fn setup(can1: Can<CAN1>, config: &CanNodeConfig) -> Result<Can1, CanConfigError> {
    config.check()?;

    let mut can = bxcan::Can::builder(can1)
        .set_bit_timing(config.bit_timing)
        // 回环时同时打开静默模式，这样发出的帧只会回到自己的接收端，不会出现在 TX 引脚上
        .set_loopback(config.bus_loopback)
        .set_silent(config.bus_loopback)
        .enable();

    if let Some(filter) = config.filter {
        let id =
            StandardId::new(filter.id).ok_or(CanConfigError::FilterIdNotStandard(filter.id))?;

        // 掩码为 StandardId::MAX，也就是 11 位全部参与比较，只有 ID 完全一致的帧才能通过
        can.modify_filters().enable_bank(
            filter.number,
            Fifo::Fifo0,
            Mask32::frames_with_std_id(id, StandardId::MAX),
        );
    }

    let mut interrupts = Interrupts::empty();

    if config.frame.transmits() && config.transmission_completed.is_some() {
        interrupts |= Interrupts::TRANSMIT_MAILBOX_EMPTY;
    }

    if config.frame.receives() && config.message_stored.is_some() {
        interrupts |= Interrupts::FIFO0_MESSAGE_PENDING;
    }

    can.enable_interrupts(interrupts);

    Ok(can)
}
