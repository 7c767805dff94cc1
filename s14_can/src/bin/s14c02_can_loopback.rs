//! CAN 回环
//!
//! 在 s14c01_can_external 中，我们需要一个收发器，还需要总线上的另一个节点，才能看到接收的效果
//! 这里我们利用 bxCAN 自带的两个测试模式，在没有任何外部连接的情况下，自己发、自己收：
//!
//! - 回环模式（loopback）：bxCAN 把自己发送的帧直接送回自己的接收端，同时忽略 RX 引脚上的电平
//! - 静默模式（silent）：bxCAN 不会在 TX 引脚上输出任何显性位，总线上的其它节点完全感知不到它
//!
//! 两个模式同时打开，就是 Reference Manual 中说的 Loop back combined with silent mode，也叫“热自测”模式
//! 另外，回环模式下，bxCAN 会自己给自己应答（ACK），所以不需要总线上有其它节点
//!
//! 这个例程要做的事情：
//!
//! - 每隔 1 秒，先把接收缓冲填满 0xA5，然后以 ID 0x60 发送一帧，内容为两个 32 位的字 0x0DEAD007 和 0xBA5EBA11
//! - 发送完成时，点亮 LED1
//! - 滤波器只放行 ID 为 0x60 的帧，收到的帧与发出的帧 ID 和数据都完全一致时，点亮 LED2
//!
//! 电路连接方案：
//! GPIO PC13 <-> LED1（低电平点亮）
//! GPIO PC14 <-> LED2（低电平点亮）
//! PB8/PB9 依旧要设置为 CAN1 的复用功能，不过不需要连接任何东西

#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use demo_common::{
    boot::{self, CpuSyncEvent},
    can::{
        from_frame, send_until_accepted, to_frame, CanMessage, CanNodeConfig,
        LoopbackNodeHandlers, ACCEPTED_ID, BIT_TIMING_500K_AT_16MHZ, TX_INTERVAL_MS,
    },
    indicator::{Indicator, LED1, LED2},
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

type Handlers = LoopbackNodeHandlers<PC13<Output<PushPull>>, PC14<Output<PushPull>>>;

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

    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let gpiob = dp.GPIOB.split();
    let gpioc = dp.GPIOC.split();

    rprintln!("LED1: {}", LED1);
    rprintln!("LED2: {}", LED2);

    let handlers = LoopbackNodeHandlers::new(
        Indicator::new(gpioc.pc13.into_push_pull_output()).unwrap(),
        Indicator::new(gpioc.pc14.into_push_pull_output()).unwrap(),
        CanMessage::demo(ACCEPTED_ID),
    );

    let node_config = CanNodeConfig::loopback_node(BIT_TIMING_500K_AT_16MHZ);

    cortex_m::interrupt::free(|cs| {
        let can1 = Can::new(dp.CAN1, (gpiob.pb9, gpiob.pb8));
        let can = setup_can::setup(can1, &node_config).expect("Invalid CAN node config");

        G_CAN.borrow(cs).replace(Some(can));
        G_HANDLERS.borrow(cs).replace(Some(handlers));
    });

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

    let mut delay = cortex_m::delay::Delay::new(cp.SYST, clocks.sysclk().raw());

    loop {
        delay.delay_ms(TX_INTERVAL_MS);

        // 作废上一次收到的内容，这样如果这一次什么都没收到，接收缓冲里就只有 0xA5
        let tx_msg = cortex_m::interrupt::free(|cs| {
            G_HANDLERS
                .borrow(cs)
                .borrow_mut()
                .as_mut()
                .unwrap()
                .prepare_transmit()
        });

        let tx_frame = to_frame(&tx_msg).expect("Invalid TX ID");

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

        loop {
            match can.receive() {
                Ok(frame) => {
                    let Some(msg) = from_frame(&frame) else {
                        continue;
                    };
                    if !handlers.on_message_received(&msg).unwrap() {
                        rprintln!("loopback mismatch: {:X?}", msg);
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => rprintln!("CAN RX FIFO overrun"),
            }
        }
    });
}
