//! 收到命令后再应答
//!
//! 与 s05c01_ack_tx 使用同一套中断驱动的串口驱动，区别在于，这里主循环不再不停地发送，
//! 而是先等待电脑发来一个字符，只有收到的字符是 '1' 时，才发送一次 "Transfer completed\r\n"
//!
//! 接收的过程与发送对称：
//! RXNE 中断触发时，驱动把 DR 中的字节搬进软件 RX FIFO，主循环的 read 再从 RX FIFO 中取出字节
//! 如果主循环来不及取，RX FIFO 满了，多出来的字节会被丢弃，并记为一次 overrun
//!
//! 可以用任意一个串口终端（比如 picocom、minicom）打开 DAPLink 的虚拟串口来测试，
//! 每输入一个 1，终端上就会出现一行 Transfer completed
//!
//! 串口参数：115200 Baud，8 位数据位，1 位停止位，无校验
//! 电路连接方案：GPIO PA9 <-> DAPLink Rx，GPIO PA10 <-> DAPLink Tx

#![no_std]
#![no_main]

use demo_common::{
    asc::{
        Asc, AscConfig, SharedAsc, ACK_TEXT, ASC_RX_BUFFER_SIZE, ASC_TX_BUFFER_SIZE,
        PASS_CHARACTER, RESET_CHARACTER,
    },
    boot::{self, CpuSyncEvent},
};
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
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

    G_ASC.install(Asc::new(UsartLine::new(tx, rx)));

    unsafe {
        cp.NVIC
            .set_priority(interrupt::USART1, asc_config.shared_priority().to_nvic());
        NVIC::unmask(interrupt::USART1);
    }

    rprintln!(
        "USART1 ready, send '{}' to get an ack",
        PASS_CHARACTER as char
    );

    loop {
        // 先清空上一次收到的字符，再一直等到收到 PASS_CHARACTER
        let mut received = [RESET_CHARACTER];
        while received[0] != PASS_CHARACTER {
            G_ASC.read(&mut received).unwrap();
        }

        G_ASC.write(ACK_TEXT).unwrap();
        G_ASC.flush().unwrap();

        let errors = G_ASC.errors().unwrap();
        if errors.total() > 0 {
            rprintln!("line errors: {:?}", errors);
        }
    }
}

#[interrupt]
fn USART1() {
    G_ASC.on_interrupt();
}
