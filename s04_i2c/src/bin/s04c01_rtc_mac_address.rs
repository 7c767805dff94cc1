//! 读取 RTC 芯片中出厂写入的 MAC 地址
//!
//! MCP79411 是 Microchip 生产的一颗 I2C 接口的 RTC 芯片，它除了 RTC 和 64 字节的 SRAM 以外，还带有 1 Kbit 的 EEPROM，
//! 而 EEPROM 中有一块受保护的区域，Microchip 在出厂时就在里面写入了一个全球唯一的 EUI-48 地址，可以直接拿来当作网卡的 MAC 地址使用
//!
//! 这颗芯片在 I2C 总线上占用了两个地址：
//!
//! 0x6F（0b1101111）：RTC 和 SRAM
//! 0x57（0b1010111）：EEPROM，包括存放 EUI-48 的受保护区域
//!
//! EUI-48 存放在 EEPROM 的 0xF2 ~ 0xF7 这 6 个字节中，读取它的方法和 AT24 系列 EEPROM 的“在指定位置读”一样：
//! 先写一个字节的地址 0xF2，让芯片内部的地址指针指向它，然后再另起一次读操作，连续读出 6 个字节
//!
//! 需要注意的是，EEPROM 在上电后或者写入时会有一小段时间不响应自己的地址（回复 NACK），
//! 因此每一步在收到 NACK 时都会重试，直到芯片响应为止
//!
//! 读出来的地址会被存进一个只能写入一次的全局变量 G_MAC 中，之后程序就什么都不做了
//!
//! 电路连接方案：
//! GPIO PB6 <-> SCL
//! GPIO PB7 <-> SDA
//! 模块上已经有了上拉电阻，这里就不需要额外的上拉电阻了

#![no_std]
#![no_main]

use demo_common::{
    boot::{self, CpuSyncEvent},
    rtc::{read_mac_address, MacAddress, StoredOnce, I2C_BAUDRATE_HZ, MCP79411_EEPROM_ADDRESS},
};
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f4xx_hal::{i2c::I2c, pac::Peripherals, prelude::*};

static G_MAC: StoredOnce<MacAddress> = StoredOnce::new();

static G_CPU_SYNC: CpuSyncEvent = CpuSyncEvent::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("Start Program");

    boot::sync_cores(&G_CPU_SYNC, 0, 1);

    let dp = Peripherals::take().expect("Cannot Get Peripherals");
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let gpiob = dp.GPIOB.split();

    // 400 kHz 超过了 standard mode 的 100 kHz，HAL 会自动切换到 fast mode
    let mut rtc_i2c = I2c::new(
        dp.I2C1,
        (gpiob.pb6, gpiob.pb7),
        I2C_BAUDRATE_HZ.Hz(),
        &clocks,
    );

    rprintln!(
        "read EUI-48 from device 0x{:02X} at {} Hz",
        MCP79411_EEPROM_ADDRESS,
        I2C_BAUDRATE_HZ
    );

    let mac = read_mac_address(&mut rtc_i2c).expect("I2C bus error");

    if !G_MAC.store(mac) {
        rprintln!("MAC address has already been stored");
    }

    rprintln!("MAC: {}", mac);

    #[allow(clippy::empty_loop)]
    loop {}
}
