//! ADC 队列扫描
//!
//! 队列中的每一项是一个 ADC channel，队列交给硬件之后，ADC 自己按顺序一项一项地转换下去，
//! 中间不需要 CPU 参与，第 i 项的结果总是放在第 i 个结果寄存器里
//!
//! CPU 要做的只是时不时把结果寄存器读出来，`QueuedScan` 保存的就是每一项最新的结果，不保留历史值

/// 能按队列自动转换的 ADC
pub trait QueuedRequest {
    /// 把队列写进硬件并启动转换，之后硬件会一直按队列顺序转换下去
    fn start(&mut self, channels: &[u8]);

    /// 队列中第 `position` 项最新的结果
    ///
    /// 硬件还没完成过一整轮，或者这一项的 channel 在当前板子上没有接线时，返回 None
    fn read_result(&mut self, position: usize) -> Option<u16>;
}

/// 队列中某一项最近一次的转换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionResult {
    pub channel: u8,
    pub value: u16,
    /// 是否已经有过至少一次转换
    pub valid: bool,
}

pub struct QueuedScan<const N: usize> {
    channels: [u8; N],
    results: [ConversionResult; N],
}

impl<const N: usize> QueuedScan<N> {
    pub const fn new(channels: [u8; N]) -> Self {
        let mut results = [ConversionResult {
            channel: 0,
            value: 0,
            valid: false,
        }; N];

        let mut i = 0;
        while i < N {
            results[i].channel = channels[i];
            i += 1;
        }

        Self { channels, results }
    }

    /// 把队列交给硬件，只需要调用一次
    pub fn start(&self, adc: &mut impl QueuedRequest) {
        adc.start(&self.channels);
    }

    /// 读出每一项的结果寄存器，返回拿到结果的项数
    pub fn update(&mut self, adc: &mut impl QueuedRequest) -> usize {
        let mut updated = 0;

        for (position, slot) in self.results.iter_mut().enumerate() {
            if let Some(value) = adc.read_result(position) {
                slot.value = value;
                slot.valid = true;
                updated += 1;
            }
        }

        updated
    }

    /// 某个 channel 最新的结果，未在队列中或从未转换成功时返回 None
    ///
    /// 同一个 channel 在队列中出现多次时，排在后面的那一项转换得更晚
    pub fn result(&self, channel: u8) -> Option<ConversionResult> {
        self.results
            .iter()
            .rev()
            .find(|slot| slot.channel == channel && slot.valid)
            .copied()
    }

    pub fn results(&self) -> &[ConversionResult; N] {
        &self.results
    }

    pub fn channels(&self) -> &[u8; N] {
        &self.channels
    }
}
