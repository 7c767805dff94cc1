//! 中断驱动的串口发送
//!
//! 最直接的发送方式，是轮询 TXE 位，一个字节一个字节地把数据写进 DR 寄存器，
//! 这样发送期间 Cortex 核心什么都做不了，只能等待串口
//!
//! 这里我们换一种做法，让 s00_common 中的串口驱动来处理发送：
//!
//! 1. 主循环调用 write，只是把要发送的字节放进一个软件 FIFO（heapless 提供的 spsc::Queue），然后打开 TXE 中断
//! 2. 由于 DR 此时是空的，TXE 中断立刻就会触发，中断处理函数把 FIFO 中的字节搬进 DR，直到 DR 再次变满
//! 3. 每发完一个字节，TXE 中断都会再次触发，直到 FIFO 被清空，此时驱动会关闭 TXE 中断，
//!    否则“发送寄存器为空”这个状态会让中断一直触发，主循环就再也跑不起来了
//!
//! USART1 在 NVIC 中只有一个中断向量，接收、发送、错误都会进入这同一个中断处理函数，
//! 因此 USART1 中断里只做一件事，那就是调用驱动的 on_interrupt，剩下的全部由驱动处理
//!
//! 主循环不停地发送 "Transfer completed\r\n"，每次都等待它完全发送出去（flush），再发送下一次
//!
//! 串口参数：115200 Baud，8 位数据位，1 位停止位，无校验
//! 电路连接方案：GPIO PA9 <-> DAPLink Rx，GPIO PA10 <-> DAPLink Tx

#![no_std]
#![no_main]

use demo_common::{
    asc::{Asc, AscConfig, SharedAsc, ACK_TEXT, ASC_RX_BUFFER_SIZE, ASC_TX_BUFFER_SIZE},
    boot::{self, CpuSyncEvent},
};
use panic_rtt_target as _;
use rtt_target::{rprint, rprintln, rtt_init_print};
use stm32f4xx_hal::{
    interrupt,
    pac::{CorePeripherals, Peripherals, NVIC},
    prelude::*,
    serial::{config::Config, Serial},
};

mod utils;
use utils::usart_line::UsartLine;

static G_ASC: SharedAsc<UsartLine, ASC_TX_BUFFER_SIZE, ASC_RX_BUFFER_SIZE> = SharedAsc::new();

static G_CPU_SYNC: CpuSyncEvent = CpuSyncEvent::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("Start Program");

    boot::sync_cores(&G_CPU_SYNC, 0, 1);

    let dp = Peripherals::take().expect("Cannot Get Peripherals");
    let mut cp = CorePeripherals::take().expect("Cannot Get Core Peripherals");

    // 使用默认的 16 MHz HSI，115200 Baud 下的误差约为 0.08%，完全够用
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let gpioa = dp.GPIOA.split();

    let asc_config = AscConfig::default();

    let serial: Serial<_> = Serial::new(
        dp.USART1,
        (gpioa.pa9, gpioa.pa10),
        Config::default().baudrate(asc_config.baudrate.bps()),
        &clocks,
    )
    .expect("Invalid USART1 Config");

    let (tx, rx) = serial.split();

    // 驱动要先放进全局变量，才能打开中断，否则中断处理函数会找不到驱动
    G_ASC.install(Asc::new(UsartLine::new(tx, rx)));

    // 收、发、错误共用一个中断向量，取三者中最高的优先级
    unsafe {
        cp.NVIC
            .set_priority(interrupt::USART1, asc_config.shared_priority().to_nvic());
        NVIC::unmask(interrupt::USART1);
    }

    rprintln!("USART1 ready, {} Baud", asc_config.baudrate);

    let mut sent_count: u32 = 0;

    loop {
        G_ASC.write(ACK_TEXT).unwrap();
        G_ASC.flush().unwrap();

        sent_count = sent_count.wrapping_add(1);
        if sent_count % 1000 == 0 {
            rprint!("\x1b[2K\rsent: {}", sent_count);
        }
    }
}

#[interrupt]
fn USART1() {
    G_ASC.on_interrupt();
}
