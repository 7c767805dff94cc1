//! CAN 总线收发
//!
//! CAN：Controller Area Network 控制器局域网，是一种多主机、差分信号、带仲裁的串行总线，最初是为汽车中的各个电子控制单元之间的通信而设计的
//!
//! CAN 总线只有两根线 CAN_H 和 CAN_L，总线上的逻辑值由两根线之间的电压差表示：
//! 两线电压差接近 0 V 时为“隐性”（recessive），表示逻辑 1；两线电压差约为 2 V 时为“显性”（dominant），表示逻辑 0
//! 只要有一个节点输出显性，整条总线就是显性，这一点和 I2C 的“线与”是一样的，CAN 的仲裁也正是依靠这个特点完成的：
//! 多个节点同时发送时，每个节点一边发送一边监听总线，发送隐性却读到显性的节点就知道自己输掉了仲裁，立刻停止发送，
//! 因此 ID 越小（前面的显性位越多）的帧，优先级就越高
//!
//! STM32F412 上的 CAN 控制器叫做 bxCAN（Basic Extended CAN），它只负责协议部分，输出的是 TX/RX 两个单端的逻辑电平，
//! 要接到 CAN 总线上，还需要一个 CAN 收发器（transceiver）芯片把逻辑电平转换为差分信号
//! 我手上的收发器模块有一个 STB（standby）引脚，拉高时收发器处于待机状态，拉低之后它才会真正工作
//!
//! bxCAN 有 3 个发送邮箱（mailbox）和 2 个接收 FIFO，每个 FIFO 可以缓存 3 帧，
//! 收到的帧要先通过滤波器（filter），才会被放进某一个 FIFO
//!
//! 这个例程要做的事情：
//!
//! - 每隔 1 秒，以 ID 0x55 发送一个 8 字节的数据帧，内容为两个 32 位的字 0x0DEAD007 和 0xBA5EBA11
//! - 每次发送完成（发送邮箱变空），在 CAN1_TX 中断中翻转一次 LED1
//! - 滤波器只放行 ID 为 0x60 的帧，放进 FIFO 0，每收到一帧，在 CAN1_RX0 中断中翻转一次 LED2
//!
//! 所有的 CAN 配置都在同一个临界区（cortex_m::interrupt::free）中完成，临界区结束时中断的开关状态会恢复为进入前的样子
//!
//! 电路连接方案：
//! GPIO PB9 <-> 收发器 TXD
//! GPIO PB8 <-> 收发器 RXD
//! GPIO PB0 <-> 收发器 STB
//! GPIO PC13 <-> LED1（低电平点亮）
//! GPIO PC14 <-> LED2（低电平点亮）
//!
//! 总线上还需要另外一个节点，每隔一段时间发送 ID 为 0x60 的帧，可以用 USB-CAN 适配器来充当这个节点
//! 另外别忘了，CAN 总线的两端各需要一个 120 Ω 的终端电阻

#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use demo_common::{
    boot::{self, CpuSyncEvent},
    can::{
        from_frame, send_until_accepted, to_frame, CanMessage, CanNodeConfig,
        ExternalNodeHandlers, BIT_TIMING_500K_AT_16MHZ, EXTERNAL_TX_ID, TX_INTERVAL_MS,
    },
    indicator::{Indicator, CAN_STB, LED1, LED2},
};
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f4xx_hal::{
    can::Can,
    gpio::{Output, PushPull, PC13, PC14},
    interrupt,
    pac::{CorePeripherals, Peripherals, NVIC},
    prelude::*,
};

mod utils;
use utils::setup_can::{self, Can1};

type Handlers = ExternalNodeHandlers<PC13<Output<PushPull>>, PC14<Output<PushPull>>>;

static G_CAN: Mutex<RefCell<Option<Can1>>> = Mutex::new(RefCell::new(None));
static G_HANDLERS: Mutex<RefCell<Option<Handlers>>> = Mutex::new(RefCell::new(None));

static G_CPU_SYNC: CpuSyncEvent = CpuSyncEvent::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("Start Program");

    boot::sync_cores(&G_CPU_SYNC, 0, 1);

    let dp = Peripherals::take().expect("Cannot Get Peripherals");
    let mut cp = CorePeripherals::take().expect("Cannot Get Core Peripherals");

    // 使用默认的 16 MHz HSI，APB1 也是 16 MHz，位时序的计算见 BIT_TIMING_500K_AT_16MHZ 的说明
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let gpiob = dp.GPIOB.split();
    let gpioc = dp.GPIOC.split();

    rprintln!("LED1: {}", LED1);
    rprintln!("LED2: {}", LED2);
    rprintln!("STB:  {}", CAN_STB);

    // 拉低 STB，让收发器离开待机状态
    let mut can_stb = gpiob.pb0.into_push_pull_output();
    can_stb.set_low();

    let handlers = ExternalNodeHandlers::new(
        Indicator::new(gpioc.pc13.into_push_pull_output()).unwrap(),
        Indicator::new(gpioc.pc14.into_push_pull_output()).unwrap(),
    );

    let node_config = CanNodeConfig::external_node(BIT_TIMING_500K_AT_16MHZ);

    cortex_m::interrupt::free(|cs| {
        let can1 = Can::new(dp.CAN1, (gpiob.pb9, gpiob.pb8));
        let can = setup_can::setup(can1, &node_config).expect("Invalid CAN node config");

        G_CAN.borrow(cs).replace(Some(can));
        G_HANDLERS.borrow(cs).replace(Some(handlers));
    });

    // 发送完成中断要比接收中断优先，数字越大越优先，写入 NVIC 之前需要转换一下
    unsafe {
        if let Some(isr) = node_config.transmission_completed {
            cp.NVIC.set_priority(interrupt::CAN1_TX, isr.priority.to_nvic());
            NVIC::unmask(interrupt::CAN1_TX);
        }
        if let Some(isr) = node_config.message_stored {
            cp.NVIC.set_priority(interrupt::CAN1_RX0, isr.priority.to_nvic());
            NVIC::unmask(interrupt::CAN1_RX0);
        }
    }

    let tx_frame = to_frame(&CanMessage::demo(EXTERNAL_TX_ID)).expect("Invalid TX ID");

    let mut delay = cortex_m::delay::Delay::new(cp.SYST, clocks.sysclk().raw());

    loop {
        delay.delay_ms(TX_INTERVAL_MS);

        // 三个发送邮箱都满了的话，transmit 会返回 WouldBlock，此时一直重试
        // 每次尝试都单独进入一次临界区，这样在等待期间，CAN 的中断依旧有机会运行
        send_until_accepted(|| {
            cortex_m::interrupt::free(|cs| {
                let mut can_ref = G_CAN.borrow(cs).borrow_mut();
                let can = can_ref.as_mut().unwrap();
                can.transmit(&tx_frame)
            })
        })
        .unwrap();
    }
}

#[interrupt]
fn CAN1_TX() {
    cortex_m::interrupt::free(|cs| {
        let mut can_ref = G_CAN.borrow(cs).borrow_mut();
        let mut handlers_ref = G_HANDLERS.borrow(cs).borrow_mut();

        if let (Some(can), Some(handlers)) = (can_ref.as_mut(), handlers_ref.as_mut()) {
            // 清除 RQCP 标志位，不然中断会一直触发
            can.clear_tx_interrupt();
            handlers.on_transmission_completed().unwrap();
        }
    });
}

#[interrupt]
fn CAN1_RX0() {
    cortex_m::interrupt::free(|cs| {
        let mut can_ref = G_CAN.borrow(cs).borrow_mut();
        let mut handlers_ref = G_HANDLERS.borrow(cs).borrow_mut();

        let (Some(can), Some(handlers)) = (can_ref.as_mut(), handlers_ref.as_mut()) else {
            return;
        };

        // FIFO 0 中可能同时有好几帧，全部取出来，FIFO 清空之后中断标志才会被清除
        loop {
            match can.receive() {
                Ok(frame) => {
                    if let Some(msg) = from_frame(&frame) {
                        handlers.on_message_received(&msg).unwrap();
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                // FIFO 溢出，丢失了一帧，剩下的帧还可以继续读
                Err(nb::Error::Other(_)) => rprintln!("CAN RX FIFO overrun"),
            }
        }
    });
}
