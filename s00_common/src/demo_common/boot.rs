//! 多核同步
//!
//! 在多核芯片上，每个核心启动后都会在同一个同步事件上“签到”，然后等待所有核心都签到完成，再进入各自的 main loop
//! 我们手上的 STM32F412 只有一个核心，因此 core_count 总是 1，签到之后会立刻通过

use core::sync::atomic::{AtomicU32, Ordering};

/// 以位图的形式记录已经签到的核心，第 n 位对应第 n 号核心
pub struct CpuSyncEvent {
    reached: AtomicU32,
}

impl CpuSyncEvent {
    pub const fn new() -> Self {
        Self {
            reached: AtomicU32::new(0),
        }
    }

    /// 第 `core_id` 号核心签到，超出 32 的核心编号会被忽略
    pub fn emit(&self, core_id: u8) {
        if core_id < 32 {
            self.reached.fetch_or(1 << core_id, Ordering::AcqRel);
        }
    }

    /// 第 0 ~ core_count-1 号核心是否都已经签到
    pub fn is_reached(&self, core_count: u8) -> bool {
        let mask = all_cores_mask(core_count);
        self.reached.load(Ordering::Acquire) & mask == mask
    }

    /// 一直空转，直到所有核心都签到
    pub fn wait(&self, core_count: u8) {
        while !self.is_reached(core_count) {
            core::hint::spin_loop();
        }
    }
}

impl Default for CpuSyncEvent {
    fn default() -> Self {
        Self::new()
    }
}

fn all_cores_mask(core_count: u8) -> u32 {
    match core_count {
        0 => 0,
        32.. => u32::MAX,
        n => (1 << n) - 1,
    }
}

/// 签到并等待其它核心，每个 bin 在初始化外设之前都会调用一次
pub fn sync_cores(event: &CpuSyncEvent, core_id: u8, core_count: u8) {
    event.emit(core_id);
    event.wait(core_count);
}
