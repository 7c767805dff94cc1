//! ADC 队列扫描
//!
//! ADC：Analog to Digital Converter，采样 GPIO 引脚上的模拟电压，并转换为数字值
//!
//! 这里我们把三个 channel 排成一个队列交给 ADC1，之后 ADC1 会自己一遍又一遍地按顺序转换它们，
//! 两次转换之间不需要 CPU 做任何事情，CPU 只负责把结果读出来
//!
//! 为了做到这一点，我们用的是 ADC 的 Injected Group（插入组）：
//!
//! - Injected Group 最多可以排 4 个 channel，而且每个位置都有自己的结果寄存器 JDR1 ~ JDR4，
//!   不像 Regular Group 所有结果都挤在同一个 DR 里，必须每转换完一个就赶紧读走
//! - CR1 的 JAUTO 位打开之后，Regular Group 每转换完一轮，Injected Group 就会被自动触发一轮
//! - 再打开 CR2 的 CONT 位，Regular Group 转换完就立刻重新开始，于是整个过程就一直循环下去了
//! - CR1 的 SCAN 位必须打开，否则 Injected Group 只会转换队列中的第一个 channel
//!
//! 要注意 JSQR 的排列方式：队列长度 JL+1 小于 4 时，转换是从 JSQ(4-JL) 开始的，
//! 比如 JL = 2 时，转换的顺序是 JSQ2、JSQ3、JSQ4，结果依次放进 JDR1、JDR2、JDR3
//!
//! 队列的行为由 s00_common 中的 QueuedScan 负责：
//!
//! - 队列的顺序就是转换的顺序，这里是 channel 7、6、5
//! - 每次读取都用新结果覆盖该 channel 上一次的结果，不保留历史值
//! - 没有接线的 channel 不会有结果
//!
//! 主循环没有任何延时，不停地读取结果寄存器，每个 channel 最新的结果被写入全局的 G_RESULTS 中，调试器可以随时查看这个变量
//!
//!
//! 引脚与 channel 的对应关系（见 datasheet 的 STM32F412xx pin definitions 表）：
//!
//! PA7 <-> ADC1_7
//! PA6 <-> ADC1_6
//! PA5 <-> ADC1_5
//!
//! 【重要】：analog 模式下的 GPIO 引脚都不是 FT 的，切勿输入高于 3.3V 的电压
//!
//! 时钟：我们直接使用默认的 16 MHz HSI，APB2 同样为 16 MHz，ADC 的预分频器为 /2，ADCCLK 为 8 MHz，在 0.6 MHz 到 36 MHz 的范围内

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU16, Ordering};

use demo_common::{
    adc::{QueuedRequest, QueuedScan},
    boot::{self, CpuSyncEvent},
};
use panic_rtt_target as _;
use rtt_target::{rprint, rprintln, rtt_init_print};
use stm32f4xx_hal::{
    gpio::{Analog, PA5, PA6, PA7},
    pac::{Peripherals, ADC1, ADC_COMMON, RCC},
    prelude::*,
};

/// 队列中的 channel，顺序即转换顺序
const QUEUED_CHANNELS: [u8; 3] = [7, 6, 5];

/// 这块板子上接了线的 channel
const WIRED_CHANNELS: [u8; 3] = [7, 6, 5];

/// Injected Group 的队列最多 4 项
const INJECTED_SLOTS: usize = 4;

/// 每读取这么多轮，才通过 RTT 打印一次，否则 RTT 的输出会拖慢主循环
const PRINT_EVERY: u32 = 10_000;

/// 每个 channel 最新的转换结果，下标与 QUEUED_CHANNELS 一一对应
static G_RESULTS: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];

static G_CPU_SYNC: CpuSyncEvent = CpuSyncEvent::new();

/// ADC1 的 Injected Group，以及这块板子上实际接线的三个引脚
struct BoardAdc {
    adc: ADC1,
    wired: [bool; INJECTED_SLOTS],
    first_round_done: bool,
    _pins: (PA7<Analog>, PA6<Analog>, PA5<Analog>),
}

impl BoardAdc {
    fn new(
        adc: ADC1,
        rcc: &RCC,
        common: &ADC_COMMON,
        pins: (PA7<Analog>, PA6<Analog>, PA5<Analog>),
    ) -> Self {
        // 开启 ADC1 的时钟
        rcc.apb2enr.modify(|_, w| w.adc1en().enabled());

        // 将 ADCCLK 的预分频器设置为 /2 模式，APB2 的 16 MHz 降低为 8 MHz
        common.ccr.modify(|_, w| w.adcpre().div2());

        // 采样时间取最长的 480 个 ADCCLK 周期，这样对信号源的输出阻抗要求最低
        adc.smpr2.modify(|_, w| {
            w.smp5().cycles480();
            w.smp6().cycles480();
            w.smp7().cycles480();
            w
        });

        Self {
            adc,
            wired: [false; INJECTED_SLOTS],
            first_round_done: false,
            _pins: pins,
        }
    }
}

impl QueuedRequest for BoardAdc {
    fn start(&mut self, channels: &[u8]) {
        let Some(&first_channel) = channels.first() else {
            return;
        };
        let len = channels.len().min(INJECTED_SLOTS);
        let first_slot = INJECTED_SLOTS - len;

        for (wired, channel) in self.wired.iter_mut().zip(channels.iter().take(len)) {
            *wired = WIRED_CHANNELS.contains(channel);
        }

        // JSQR：Injected SeQuence Register
        // JL 为队列长度减 1
        self.adc.jsqr.write(|w| unsafe {
            w.jl().bits((len - 1) as u8);
            for (i, &channel) in channels.iter().take(len).enumerate() {
                match first_slot + i {
                    0 => w.jsq1().bits(channel),
                    1 => w.jsq2().bits(channel),
                    2 => w.jsq3().bits(channel),
                    _ => w.jsq4().bits(channel),
                };
            }
            w
        });

        // Regular Group 只是用来带动 Injected Group 的，放一个 channel 就够了，它的结果我们不读
        self.adc.sqr1.modify(|_, w| w.l().bits(0));
        self.adc
            .sqr3
            .modify(|_, w| unsafe { w.sq1().bits(first_channel) });

        self.adc.cr1.modify(|_, w| {
            w.scan().enabled();
            // JAUTO: Automatic Injected group conversion
            w.jauto().enabled();
            w
        });

        self.adc.cr2.modify(|_, w| {
            w.cont().continuous();
            w.adon().enabled();
            w
        });

        // ADON 之后要等待 t_STAB（最多 3 us）ADC 才能稳定
        cortex_m::asm::delay(100);

        // 只需要启动这一次，之后转换就会一直进行下去
        self.adc.cr2.modify(|_, w| w.swstart().start());
    }

    fn read_result(&mut self, position: usize) -> Option<u16> {
        // JEOC 置位说明 Injected Group 至少转换完了一整轮，在此之前 JDR 里都是 0
        if !self.first_round_done {
            if self.adc.sr.read().jeoc().bit_is_clear() {
                return None;
            }
            self.first_round_done = true;
        }

        if !self.wired.get(position).copied().unwrap_or(false) {
            return None;
        }

        let value = match position {
            0 => self.adc.jdr1().read().jdata().bits(),
            1 => self.adc.jdr2().read().jdata().bits(),
            2 => self.adc.jdr3().read().jdata().bits(),
            3 => self.adc.jdr4().read().jdata().bits(),
            _ => return None,
        };

        Some(value)
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("Start Program");

    boot::sync_cores(&G_CPU_SYNC, 0, 1);

    let dp = Peripherals::take().expect("Cannot Get Peripherals");

    let gpioa = dp.GPIOA.split();

    let mut adc = BoardAdc::new(
        dp.ADC1,
        &dp.RCC,
        &dp.ADC_COMMON,
        (
            gpioa.pa7.into_analog(),
            gpioa.pa6.into_analog(),
            gpioa.pa5.into_analog(),
        ),
    );

    let mut scan = QueuedScan::new(QUEUED_CHANNELS);
    scan.start(&mut adc);

    rprintln!("queued request started: {:?}", scan.channels());

    let mut round: u32 = 0;

    loop {
        scan.update(&mut adc);

        for (slot, result) in G_RESULTS.iter().zip(scan.results()) {
            if result.valid {
                slot.store(result.value, Ordering::Relaxed);
            }
        }

        if round % PRINT_EVERY == 0 {
            rprint!("\x1b[2K\r{}:", round);
            for (channel, slot) in QUEUED_CHANNELS.iter().zip(G_RESULTS.iter()) {
                let raw_value = slot.load(Ordering::Relaxed);
                // 参考电压为 3.3 V，12 bit 分辨率
                let voltage_value = raw_value as f32 / (2u32.pow(12) - 1) as f32 * 3.3;
                rprint!(" ch{} {:.3} V", channel, voltage_value);
            }
        }

        round = round.wrapping_add(1);
    }
}
