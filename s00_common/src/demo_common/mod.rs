//! 各个章节的固件共用的、与具体芯片无关的部分
//!
//! 这里的代码只依赖 embedded-hal 1.0 / embedded-hal-nb 的 trait，不依赖 stm32f4xx-hal，
//! 因此可以直接在电脑上执行 `cargo test -p s00_common` 进行测试，
//! 而各个章节的 bin 负责把 stm32f4xx-hal 提供的外设“接”到这里的结构体上

#![no_std]

pub mod adc;
pub mod asc;
pub mod boot;
pub mod can;
pub mod indicator;
pub mod priority;
pub mod rtc;
